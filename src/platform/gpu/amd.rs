use std::time::Duration;

use crate::core::system_monitor::GpuReading;
use crate::error::ProbeError;
use crate::platform::command::CommandRunner;

pub const ROCM_SMI: &str = "rocm-smi";

pub(super) const PROBE_ARGS: &[&str] = &["--showuse", "--csv"];

const QUERY_ARGS: &[&str] = &[
    "--showuse",
    "--showmeminfo",
    "vram",
    "--showtemp",
    "--csv",
];

/// Query the first AMD GPU through rocm-smi's CSV output.
///
/// rocm-smi has no per-process query in CSV mode, so the process count is 0.
pub async fn query(runner: &dyn CommandRunner, timeout: Duration) -> Result<GpuReading, ProbeError> {
    let stdout = runner.run(ROCM_SMI, QUERY_ARGS, timeout).await?;
    parse_csv(&stdout)
}

/// Locate columns by header name; rocm-smi versions order and label them differently.
pub fn parse_csv(stdout: &str) -> Result<GpuReading, ProbeError> {
    let mut lines = stdout
        .lines()
        .map(str::trim)
        .skip_while(|l| !l.starts_with("device"));

    let header: Vec<&str> = lines
        .next()
        .ok_or_else(|| ProbeError::malformed(ROCM_SMI, "no CSV header"))?
        .split(',')
        .map(str::trim)
        .collect();

    let row: Vec<&str> = lines
        .find(|l| !l.is_empty())
        .ok_or_else(|| ProbeError::malformed(ROCM_SMI, "no device rows"))?
        .split(',')
        .map(str::trim)
        .collect();

    let column = |needle: &str| -> Option<&str> {
        header
            .iter()
            .position(|h| h.contains(needle))
            .and_then(|idx| row.get(idx).copied())
    };

    let usage = column("GPU use")
        .and_then(|v| v.parse::<f32>().ok())
        .ok_or_else(|| ProbeError::malformed(ROCM_SMI, "missing GPU use column"))?;
    let total = column("VRAM Total Memory")
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| ProbeError::malformed(ROCM_SMI, "missing VRAM total column"))?;
    let used = column("VRAM Total Used")
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| ProbeError::malformed(ROCM_SMI, "missing VRAM used column"))?;
    let temperature = column("Temperature")
        .and_then(|v| v.parse::<f32>().ok());

    Ok(GpuReading::new(usage, used, total, temperature, 0))
}
