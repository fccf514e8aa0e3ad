//! System monitor command handler.
//!
//! Runs the dashboard, or streams snapshots as JSON lines for scripting.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::LevelFilter;

use crate::core::config::Config;
use crate::core::system_monitor::MonitorRuntime;
use crate::ui::monitor_tui::run_monitor_app;

/// Execute the monitor command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let json_output = matches.get_flag("json");

    // Log lines would corrupt the alternate screen
    crate::init_logging(if json_output {
        LevelFilter::Warn
    } else {
        LevelFilter::Off
    });

    let mut config = super::load_config();
    if let Some(interval) = matches.get_one::<u64>("interval") {
        config.interval_ms = *interval;
    }

    // Handle JSON output mode (non-TUI)
    if json_output {
        return run_json_output(&config);
    }

    run_monitor_app(&config).context("Failed to run system monitor")
}

/// Run in JSON output mode (for scripting)
fn run_json_output(config: &Config) -> Result<()> {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();

    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::Relaxed);
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    let runtime = MonitorRuntime::start(config).context("Failed to start sampler")?;
    let mut reader = runtime.reader();
    let poll_interval = (config.interval() / 4).max(Duration::from_millis(20));

    let stdout = io::stdout();
    while !stop_flag.load(Ordering::Relaxed) && runtime.is_running() {
        if reader.has_changed() {
            let frame = reader.mark_seen();
            let line = serde_json::to_string(frame.snapshot.as_ref())?;

            let mut out = stdout.lock();
            // Stop quietly when the consumer closes the pipe
            if writeln!(out, "{}", line).and_then(|_| out.flush()).is_err() {
                break;
            }
        }

        std::thread::sleep(poll_interval);
    }

    runtime.shutdown();
    Ok(())
}
