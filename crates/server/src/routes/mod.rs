pub mod coach;
pub mod daily;
pub mod health;
pub mod puzzles;
pub mod review;
pub mod survival;
