use thiserror::Error;

/// Errors surfaced by a track catalog provider.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The requested track or playlist does not exist at the provider.
    #[error("not found in catalog: {0}")]
    NotFound(String),
    /// The provider rejected the configured credentials.
    #[error("catalog rejected credentials")]
    Unauthorized,
    /// The provider answered with an unexpected status.
    #[error("catalog returned status {status}: {message}")]
    Status { status: u16, message: String },
    /// The request never got a usable answer.
    #[error("catalog transport error: {0}")]
    Transport(String),
    /// The answer could not be decoded.
    #[error("catalog response could not be decoded: {0}")]
    Decode(String),
}
