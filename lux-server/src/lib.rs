// Library exports for lux-server
// This allows other crates in the workspace to use lux-server modules

pub mod api;
pub mod config;
pub mod credential;
pub mod db;
pub mod ranking;
pub mod rate_limit;
pub mod score;
pub mod search;
pub mod session;
pub mod state;
pub mod validation;
