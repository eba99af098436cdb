mod common;

mod playlist;
mod results;
mod scenario;
mod vote;
