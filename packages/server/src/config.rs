use common::config::SessionDefaults;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Music provider connection. The access token is obtained elsewhere.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Web API root, e.g. `https://api.spotify.com/v1`.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub access_token: String,
    /// Provider account that owns published playlists.
    pub owner_id: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub session: SessionDefaults,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("catalog.base_url", "https://api.spotify.com/v1")?
            .set_default("catalog.access_token", "")?
            .set_default("catalog.owner_id", "")?
            .set_default("catalog.timeout_secs", 10)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., SHORTLIST__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("SHORTLIST").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
