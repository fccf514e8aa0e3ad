// Platform-specific code module

pub mod command;
pub mod gpu;
pub mod sysinfo_host;

// Re-exports for clean imports
pub use command::{CommandRunner, TokioCommandRunner};
pub use sysinfo_host::SysinfoHost;
