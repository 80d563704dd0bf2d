pub mod schema;
pub mod connection;
pub mod repositories;
pub mod seed;

pub use connection::{Database, DbPool};
