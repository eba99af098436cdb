pub mod session;
pub mod shared;
