pub mod analysis;
pub mod coach;
pub mod lichess;
