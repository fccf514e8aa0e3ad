// sysdash Library - Public API

// Re-export error types
pub mod error;
pub use error::{ProbeError, Result, SysdashError};

// Module declarations
pub mod commands;
pub mod core;
pub mod platform;
pub mod ui;

// Re-export commonly used types
pub use core::config::Config;

// Initialize logging; RUST_LOG takes precedence over `default`
pub fn init_logging(default: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(default)
        .parse_default_env()
        .init();
}
