//! System monitoring core functionality.
//!
//! This module provides the sampling pipeline: metric sources, GPU provider
//! resolution, the tick scheduler, rolling history and the snapshot handoff
//! to the presentation layer.

mod gpu;
mod history;
mod host;
mod metrics;
mod network;
mod publisher;
mod resolver;
mod runtime;
mod scheduler;

pub use gpu::{estimate_from_processes, GpuSample, GpuSource, GPU_PROCESS_PATTERNS};
pub use history::{MetricHistory, Series, DEFAULT_HISTORY_SIZE, MAX_HISTORY_SIZE};
pub use host::{HostMetrics, MetricSource, SourceHealth};
pub use metrics::{
    clamp_percent, CpuMetrics, DiskMetrics, GpuFidelity, GpuProviderKind, GpuReading, GpuSnapshot,
    GpuVendor, MemoryMetrics, MetricSnapshot, NetworkCounters, NetworkRates, ProcessSample,
    Reading,
};
pub use network::{NetworkCounterState, NetworkRateCalculator};
pub use publisher::{Frame, SnapshotPublisher, SnapshotReader};
pub use resolver::{GpuProviderResolver, MAX_PROBE_TIMEOUT};
pub use runtime::MonitorRuntime;
pub use scheduler::{
    ControlCommand, MonitorState, SampleScheduler, SchedulerConfig, SchedulerState, MAX_BACKOFF,
};
