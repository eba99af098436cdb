use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::clock::SystemClock;
use tracing::{Level, info};

use server::catalog::HttpTrackCatalog;
use server::config::AppConfig;
use server::session::SessionService;
use server::state::AppState;
use server::store::SqlSessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = server::database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    server::seed::ensure_indexes(&db).await?;

    let catalog = HttpTrackCatalog::new(&config.catalog)?;
    let sessions = SessionService::new(
        Arc::new(SqlSessionStore::new(db)),
        Arc::new(catalog),
        Arc::new(SystemClock),
        config.session.clone(),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let app = server::build_router(AppState { sessions, config });

    info!("Server running at http://{}", addr);
    info!("API docs at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
