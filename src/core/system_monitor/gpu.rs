//! GPU telemetry behind a single interface.
//!
//! [`GpuSource`] reads from whatever provider the resolver picked. A native
//! vendor read that fails degrades to the process-list estimate for that tick
//! only; the resolved provider stays as it was.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use crate::error::ProbeError;
use crate::platform::command::CommandRunner;
use crate::platform::gpu::query_vendor;

use super::host::{panic_message, HostMetrics};
use super::metrics::*;

/// Process names that usually keep a GPU busy: browsers, game engines and
/// launchers, creative and streaming tools, video calls.
pub const GPU_PROCESS_PATTERNS: [&str; 23] = [
    "chrome",
    "msedge",
    "firefox",
    "steam",
    "game",
    "nvidia",
    "amd",
    "photoshop",
    "premiere",
    "afterfx",
    "davinci",
    "blender",
    "unity",
    "unreal",
    "epic",
    "fortnite",
    "valorant",
    "csgo",
    "obs64",
    "streamlabs",
    "discord",
    "teams",
    "zoom",
];

/// Result of one GPU sample.
#[derive(Debug)]
pub struct GpuSample {
    pub snapshot: GpuSnapshot,
    /// Why the native read was abandoned this tick, if it was
    pub fault: Option<ProbeError>,
}

pub struct GpuSource {
    runner: Arc<dyn CommandRunner>,
    probe_timeout: Duration,
    consecutive_failures: u32,
}

impl GpuSource {
    pub fn new(runner: Arc<dyn CommandRunner>, probe_timeout: Duration) -> Self {
        Self {
            runner,
            probe_timeout,
            consecutive_failures: 0,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Sample the GPU through `kind`. Never fails.
    ///
    /// `host` supplies the process list for the heuristic path; `memory` is the
    /// memory reading taken earlier in the same tick.
    pub async fn sample(
        &mut self,
        kind: GpuProviderKind,
        host: &mut dyn HostMetrics,
        memory: Option<&MemoryMetrics>,
    ) -> GpuSample {
        let vendor = match kind {
            GpuProviderKind::NativeVendor(vendor) => vendor,
            GpuProviderKind::HeuristicFallback => {
                return GpuSample {
                    snapshot: estimated(kind, host, memory),
                    fault: None,
                };
            }
        };

        match query_vendor(vendor, self.runner.as_ref(), self.probe_timeout).await {
            Ok(reading) => {
                if self.consecutive_failures > 0 {
                    log::info!(
                        "{} GPU readings restored after {} failed attempts",
                        vendor.label(),
                        self.consecutive_failures
                    );
                }
                self.consecutive_failures = 0;
                GpuSample {
                    snapshot: GpuSnapshot {
                        kind,
                        fidelity: GpuFidelity::Measured,
                        reading,
                    },
                    fault: None,
                }
            }
            Err(e) => {
                self.consecutive_failures += 1;
                if self.consecutive_failures == 1 {
                    log::warn!("{} GPU query failed, estimating this tick: {}", vendor.label(), e);
                } else {
                    log::debug!(
                        "{} GPU query failed (attempt {}): {}",
                        vendor.label(),
                        self.consecutive_failures,
                        e
                    );
                }
                GpuSample {
                    snapshot: estimated(kind, host, memory),
                    fault: Some(e),
                }
            }
        }
    }
}

fn estimated(
    kind: GpuProviderKind,
    host: &mut dyn HostMetrics,
    memory: Option<&MemoryMetrics>,
) -> GpuSnapshot {
    let scan = panic::catch_unwind(AssertUnwindSafe(|| host.processes()));
    let processes = match scan {
        Ok(Ok(processes)) => processes,
        Ok(Err(e)) => {
            log::debug!("process scan failed, estimating GPU load from nothing: {}", e);
            Vec::new()
        }
        Err(payload) => {
            log::warn!(
                "process scan panicked, estimating GPU load from nothing: {}",
                panic_message(payload.as_ref())
            );
            Vec::new()
        }
    };

    GpuSnapshot {
        kind,
        fidelity: GpuFidelity::Estimated,
        reading: estimate_from_processes(&processes, memory),
    }
}

/// Approximate GPU figures from the process list.
///
/// This is NOT a measurement. It keeps the GPU chart moving on machines with
/// no readable sensor:
/// - usage: `Σ(cpu% * 0.3 + mem% * 2)` over processes whose name matches
///   [`GPU_PROCESS_PATTERNS`], clamped to `[0, 100]`
/// - memory used / total: 30% of used and 50% of total system memory
/// - temperature: `40 + 0.4 * usage` °C
/// - process count: number of matching processes
pub fn estimate_from_processes(
    processes: &[ProcessSample],
    memory: Option<&MemoryMetrics>,
) -> GpuReading {
    let (matched, load) = processes
        .iter()
        .filter(|p| is_gpu_intensive(&p.name))
        .fold((0u32, 0.0f64), |(count, load), p| {
            let contribution = non_negative(p.cpu_percent) * 0.3 + non_negative(p.memory_percent) * 2.0;
            (count + 1, load + contribution)
        });

    let usage = load.min(100.0) as f32;
    let (used_system, total_system) = memory
        .map(|m| (m.used_bytes, m.total_bytes))
        .unwrap_or((0, 0));

    GpuReading::new(
        usage,
        (used_system as f64 * 0.3) as u64,
        (total_system as f64 * 0.5) as u64,
        Some(40.0 + usage * 0.4),
        matched,
    )
}

fn is_gpu_intensive(name: &str) -> bool {
    let name = name.to_lowercase();
    GPU_PROCESS_PATTERNS.iter().any(|p| name.contains(p))
}

fn non_negative(value: f32) -> f64 {
    if value.is_finite() && value > 0.0 {
        value as f64
    } else {
        0.0
    }
}
