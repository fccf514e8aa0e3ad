use std::time::Duration;

use crate::core::system_monitor::GpuReading;
use crate::error::ProbeError;
use crate::platform::command::CommandRunner;

pub const NVIDIA_SMI: &str = "nvidia-smi";

pub(super) const PROBE_ARGS: &[&str] = &[
    "--query-gpu=utilization.gpu",
    "--format=csv,noheader,nounits",
];

const QUERY_ARGS: &[&str] = &[
    "--query-gpu=utilization.gpu,memory.used,memory.total,temperature.gpu",
    "--format=csv,noheader,nounits",
];

const COMPUTE_APPS_ARGS: &[&str] = &["--query-compute-apps=pid", "--format=csv,noheader"];

const MIB: f64 = 1024.0 * 1024.0;

/// Query the first NVIDIA GPU through nvidia-smi.
///
/// The process count comes from a second query; if that one fails the count is 0.
pub async fn query(runner: &dyn CommandRunner, timeout: Duration) -> Result<GpuReading, ProbeError> {
    let stdout = runner.run(NVIDIA_SMI, QUERY_ARGS, timeout).await?;
    let stats = parse_query_output(&stdout)?;

    let process_count = match runner.run(NVIDIA_SMI, COMPUTE_APPS_ARGS, timeout).await {
        Ok(out) => count_pids(&out),
        Err(e) => {
            log::debug!("nvidia-smi compute-apps query failed: {}", e);
            0
        }
    };

    Ok(GpuReading::new(
        stats.usage_percent,
        stats.memory_used_bytes,
        stats.memory_total_bytes,
        stats.temperature_celsius,
        process_count,
    ))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NvidiaStats {
    pub usage_percent: f32,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub temperature_celsius: Option<f32>,
}

/// Parse `utilization, memory.used (MiB), memory.total (MiB), temperature` for the first GPU.
pub fn parse_query_output(stdout: &str) -> Result<NvidiaStats, ProbeError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| ProbeError::malformed(NVIDIA_SMI, "empty output"))?;

    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 4 {
        return Err(ProbeError::malformed(
            NVIDIA_SMI,
            format!("expected 4 fields, got {}: {:?}", parts.len(), line),
        ));
    }

    let field = |idx: usize, name: &str| -> Result<f64, ProbeError> {
        parts[idx]
            .parse::<f64>()
            .map_err(|_| ProbeError::malformed(NVIDIA_SMI, format!("bad {}: {:?}", name, parts[idx])))
    };

    let usage = field(0, "utilization")?;
    let used_mib = field(1, "memory.used")?;
    let total_mib = field(2, "memory.total")?;
    // Some boards report temperature as [N/A]
    let temperature = parts[3].parse::<f32>().ok();

    Ok(NvidiaStats {
        usage_percent: usage as f32,
        memory_used_bytes: (used_mib.max(0.0) * MIB) as u64,
        memory_total_bytes: (total_mib.max(0.0) * MIB) as u64,
        temperature_celsius: temperature,
    })
}

/// One PID per non-empty line.
pub fn count_pids(stdout: &str) -> u32 {
    stdout.lines().filter(|l| !l.trim().is_empty()).count() as u32
}
