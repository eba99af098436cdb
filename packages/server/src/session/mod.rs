mod error;
mod playlist;
mod service;

pub use error::SessionError;
pub use service::SessionService;
