// UI and formatting module

pub mod formatters;
pub mod monitor_tui;

// Re-export commonly used items for cleaner imports
pub use formatters::{format_rate, format_size, format_timestamp, or_na};
