//! GPU-specific platform code.
//!
//! Native GPU telemetry comes from vendor diagnostic executables:
//! NVIDIA (nvidia-smi) and AMD (rocm-smi).

pub mod amd;
pub mod nvidia;

use std::time::Duration;

use crate::core::system_monitor::{GpuReading, GpuVendor};
use crate::error::ProbeError;
use crate::platform::command::CommandRunner;

/// A cheap command whose success means the vendor tool can talk to a GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorProbe {
    pub vendor: GpuVendor,
    pub program: &'static str,
    pub args: &'static [&'static str],
}

/// Probes in order of preference:
/// 1. NVIDIA (nvidia-smi)
/// 2. AMD (rocm-smi)
pub const VENDOR_PROBES: [VendorProbe; 2] = [
    VendorProbe {
        vendor: GpuVendor::Nvidia,
        program: nvidia::NVIDIA_SMI,
        args: nvidia::PROBE_ARGS,
    },
    VendorProbe {
        vendor: GpuVendor::Amd,
        program: amd::ROCM_SMI,
        args: amd::PROBE_ARGS,
    },
];

/// Read the current GPU state from the given vendor's tool
pub async fn query_vendor(
    vendor: GpuVendor,
    runner: &dyn CommandRunner,
    timeout: Duration,
) -> Result<GpuReading, ProbeError> {
    match vendor {
        GpuVendor::Nvidia => nvidia::query(runner, timeout).await,
        GpuVendor::Amd => amd::query(runner, timeout).await,
    }
}
