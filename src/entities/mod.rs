pub mod prelude;

pub mod messages;
pub mod scores;
pub mod tools;
pub mod users;
