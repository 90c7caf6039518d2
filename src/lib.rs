pub mod app;
pub mod audit;
pub mod backlog;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod input;

pub use error::{Result, SyncError};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
