mod error;
mod traits;
mod types;

pub use error::CatalogError;
pub use traits::TrackCatalog;
pub use types::{CatalogPlaylist, Track};
