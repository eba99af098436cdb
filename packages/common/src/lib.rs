pub mod candidate;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod phase;
pub mod quota;
pub mod records;
pub mod store;
pub mod tally;

pub use candidate::Candidate;
pub use phase::Phase;
pub use quota::QuotaViolation;
pub use records::{NewPlaylist, NewSession, NewSubmission, Playlist, Session, Submission, Vote};
pub use tally::RankedResult;
