pub mod context;
pub mod models;

pub use context::*;
pub use models::*;
