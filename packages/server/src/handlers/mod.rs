pub mod playlist;
pub mod session;
pub mod submission;
pub mod track;
pub mod vote;
