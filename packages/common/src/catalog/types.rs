use serde::{Deserialize, Serialize};

/// Track metadata as reported by the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Track {
    #[schema(example = "4uLU6hMCjMI75M1A2tKUQC")]
    pub id: String,
    #[schema(example = "Never Gonna Give You Up")]
    pub name: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    #[schema(example = 213573)]
    pub duration_ms: u64,
    /// Link to the track at the provider.
    pub url: Option<String>,
}

/// A playlist as it exists at the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CatalogPlaylist {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub track_ids: Vec<String>,
}
