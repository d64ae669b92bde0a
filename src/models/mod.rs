pub mod betsapi;
pub mod football_match;
pub mod sync;
