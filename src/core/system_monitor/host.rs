use std::panic::{self, AssertUnwindSafe};

use crate::error::{Result, SysdashError};

use super::metrics::*;

/// OS-level metrics facility the sources read from.
///
/// Each call refreshes only what it needs. Implementations are used from
/// the single sampling task and never shared.
pub trait HostMetrics: Send {
    fn cpu(&mut self) -> Result<CpuMetrics>;

    fn memory(&mut self) -> Result<MemoryMetrics>;

    /// Space on the configured mount point
    fn disk(&mut self) -> Result<DiskMetrics>;

    /// Cumulative bytes summed over all interfaces
    fn network_counters(&mut self) -> Result<NetworkCounters>;

    fn processes(&mut self) -> Result<Vec<ProcessSample>>;
}

/// The metric sources sampled on every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricSource {
    Cpu,
    Memory,
    Disk,
    Network,
    Gpu,
}

impl MetricSource {
    const COUNT: usize = 5;

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            MetricSource::Cpu => "cpu",
            MetricSource::Memory => "memory",
            MetricSource::Disk => "disk",
            MetricSource::Network => "network",
            MetricSource::Gpu => "gpu",
        }
    }
}

/// Remembers which sources failed last tick so outages are logged once, not every second.
#[derive(Debug, Clone)]
pub struct SourceHealth {
    failing: [bool; MetricSource::COUNT],
}

impl Default for SourceHealth {
    fn default() -> Self {
        Self {
            failing: [false; MetricSource::COUNT],
        }
    }
}

impl SourceHealth {
    pub fn is_failing(&self, source: MetricSource) -> bool {
        self.failing[source.index()]
    }

    /// Run one source call in isolation.
    ///
    /// Errors and panics both fold into [`Reading::Unavailable`]; neither
    /// escapes to the caller.
    pub fn sample<T, F>(&mut self, source: MetricSource, f: F) -> Reading<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let result = panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
            Err(SysdashError::metric_collection(format!(
                "{} source panicked: {}",
                source.name(),
                panic_message(payload.as_ref())
            )))
        });

        let was_failing = std::mem::replace(&mut self.failing[source.index()], result.is_err());
        match result {
            Ok(value) => {
                if was_failing {
                    log::info!("{} source recovered", source.name());
                }
                Reading::Available(value)
            }
            Err(e) => {
                if was_failing {
                    log::debug!("{} source still unavailable: {}", source.name(), e);
                } else {
                    log::warn!("{} source unavailable: {}", source.name(), e);
                }
                Reading::unavailable(e.to_string())
            }
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
