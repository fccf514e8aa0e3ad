use std::sync::Arc;
use std::time::Duration;

use crate::platform::command::CommandRunner;
use crate::platform::gpu::{VendorProbe, VENDOR_PROBES};

use super::metrics::GpuProviderKind;

/// Upper bound on a single vendor probe
pub const MAX_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Picks the GPU provider by probing vendor tools in priority order.
///
/// Run at startup and on manual restart only; probing spawns processes.
pub struct GpuProviderResolver {
    runner: Arc<dyn CommandRunner>,
    probes: Vec<VendorProbe>,
    timeout: Duration,
}

impl GpuProviderResolver {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self::with_probes(runner, VENDOR_PROBES.to_vec(), timeout)
    }

    pub fn with_probes(
        runner: Arc<dyn CommandRunner>,
        probes: Vec<VendorProbe>,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            probes,
            timeout: timeout.min(MAX_PROBE_TIMEOUT),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// First probe that succeeds wins; [`GpuProviderKind::HeuristicFallback`] otherwise.
    pub async fn resolve(&self) -> GpuProviderKind {
        for probe in &self.probes {
            match self.runner.run(probe.program, probe.args, self.timeout).await {
                Ok(_) => {
                    log::info!("{} GPU detected via {}", probe.vendor.label(), probe.program);
                    return GpuProviderKind::NativeVendor(probe.vendor);
                }
                Err(e) => {
                    log::debug!("{} probe failed: {}", probe.program, e);
                }
            }
        }

        log::info!("No GPU monitoring tool available - using heuristic fallback");
        GpuProviderKind::HeuristicFallback
    }
}
