//! Command handlers: bridge CLI args -> engine -> output formatting.

pub mod batch;
pub mod cache;
pub mod config_cmd;
pub mod devices;
pub mod query;
