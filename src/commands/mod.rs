// Command handlers module
pub mod monitor;
pub mod probe;

use crate::core::config::Config;

/// Load the config file, falling back to defaults when it can't be located or read
pub(crate) fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        log::warn!("Using default configuration: {:#}", e);
        Config::default()
    })
}
