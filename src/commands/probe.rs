//! One-shot GPU provider detection.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::*;
use humansize::{format_size, DECIMAL};
use log::LevelFilter;

use crate::core::config::Config;
use crate::core::system_monitor::{
    GpuFidelity, GpuProviderKind, GpuProviderResolver, GpuSource, HostMetrics,
};
use crate::platform::command::{CommandRunner, TokioCommandRunner};
use crate::platform::gpu::VENDOR_PROBES;
use crate::platform::sysinfo_host::SysinfoHost;
use crate::ui::formatters::NOT_AVAILABLE;

/// Execute the probe command
pub fn execute(_matches: &ArgMatches) -> Result<()> {
    crate::init_logging(LevelFilter::Info);
    let config = super::load_config();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    runtime.block_on(probe(&config));
    Ok(())
}

async fn probe(config: &Config) {
    let runner: Arc<dyn CommandRunner> = Arc::new(TokioCommandRunner);

    println!("\n{}", "GPU PROVIDER PROBE".bold().bright_cyan());
    println!("{}", "=".repeat(60));

    for probe in VENDOR_PROBES.iter() {
        let status = match which::which(probe.program) {
            Ok(path) => format!("{}", path.display()).green(),
            Err(_) => "not installed".dimmed(),
        };
        println!(
            "  {:<8} {:<12} {}",
            probe.vendor.label().bold(),
            probe.program,
            status
        );
    }

    let resolver = GpuProviderResolver::new(runner.clone(), config.probe_timeout());
    let kind = resolver.resolve().await;

    let kind_label = match kind {
        GpuProviderKind::NativeVendor(_) => kind.to_string().green().bold(),
        GpuProviderKind::HeuristicFallback => kind.to_string().yellow().bold(),
    };
    println!("\n  {:<14} {}", "Provider:".white().bold(), kind_label);

    let mut host = SysinfoHost::new(config.disk_mount());
    let memory = host.memory().ok();
    let mut source = GpuSource::new(runner, config.probe_timeout());
    let sample = source.sample(kind, &mut host, memory.as_ref()).await;
    let reading = &sample.snapshot.reading;

    let fidelity = match sample.snapshot.fidelity {
        GpuFidelity::Measured => "measured".green(),
        GpuFidelity::Estimated => "estimated".yellow(),
    };

    println!("  {:<14} {}", "Reading:".white().bold(), fidelity);
    println!("  {:<14} {:.1}%", "Usage:", reading.usage_percent);
    println!(
        "  {:<14} {} / {}",
        "Memory:",
        format_size(reading.memory_used_bytes, DECIMAL),
        format_size(reading.memory_total_bytes, DECIMAL)
    );
    match reading.temperature_celsius {
        Some(t) => println!("  {:<14} {:.0}°C", "Temperature:", t),
        None => println!("  {:<14} {}", "Temperature:", NOT_AVAILABLE.dimmed()),
    }
    println!("  {:<14} {}", "Processes:", reading.process_count);

    if let Some(fault) = sample.fault {
        println!("\n  {} {}", "Native query failed:".red(), fault);
    }
    println!();
}
