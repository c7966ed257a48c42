pub mod message;
pub mod score;
pub mod tool;
pub mod user;
