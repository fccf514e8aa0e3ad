use serde::{Deserialize, Serialize};

/// Complete system metrics snapshot for one tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub timestamp: i64, // Unix timestamp
    pub cpu: Reading<CpuMetrics>,
    pub memory: Reading<MemoryMetrics>,
    pub disk: Reading<DiskMetrics>,
    pub network: Reading<NetworkRates>,
    pub gpu: GpuSnapshot,
}

impl Default for MetricSnapshot {
    /// Placeholder published before the first tick completes.
    fn default() -> Self {
        Self {
            timestamp: 0,
            cpu: Reading::pending(),
            memory: Reading::pending(),
            disk: Reading::pending(),
            network: Reading::pending(),
            gpu: GpuSnapshot::default(),
        }
    }
}

/// A per-source value that is either present or explicitly unavailable for this tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Reading<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Reading<T> {
    pub fn unavailable<S: Into<String>>(reason: S) -> Self {
        Reading::Unavailable {
            reason: reason.into(),
        }
    }

    fn pending() -> Self {
        Self::unavailable("waiting for first sample")
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Reading::Available(value) => Some(value),
            Reading::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Available(_))
    }

    pub fn map<U, F: FnOnce(&T) -> U>(&self, f: F) -> Option<U> {
        self.value().map(f)
    }
}

impl<T, E: std::fmt::Display> From<std::result::Result<T, E>> for Reading<T> {
    fn from(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(value) => Reading::Available(value),
            Err(e) => Reading::unavailable(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuMetrics {
    pub usage_percent: f32,
    pub frequency_mhz: u64,
    pub physical_cores: Option<usize>,
    pub logical_cores: usize,
    pub temperature_celsius: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetrics {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub usage_percent: f32,
}

impl MemoryMetrics {
    pub fn from_totals(total_bytes: u64, used_bytes: u64, available_bytes: u64) -> Self {
        Self {
            total_bytes,
            used_bytes,
            available_bytes,
            usage_percent: percent_of(used_bytes, total_bytes),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskMetrics {
    pub mount_point: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub usage_percent: f32,
}

impl DiskMetrics {
    pub fn from_space(mount_point: impl Into<String>, total_bytes: u64, free_bytes: u64) -> Self {
        let used_bytes = total_bytes.saturating_sub(free_bytes);
        Self {
            mount_point: mount_point.into(),
            total_bytes,
            used_bytes,
            free_bytes: free_bytes.min(total_bytes),
            usage_percent: percent_of(used_bytes, total_bytes),
        }
    }
}

/// Cumulative byte counters summed over all interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCounters {
    pub sent: u64,
    pub received: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkRates {
    pub upload_bytes_per_sec: f64,
    pub download_bytes_per_sec: f64,
}

/// One process as seen by the heuristic GPU estimator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessSample {
    pub name: String,
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GpuVendor {
    Nvidia,
    Amd,
}

impl GpuVendor {
    pub fn label(self) -> &'static str {
        match self {
            GpuVendor::Nvidia => "nvidia",
            GpuVendor::Amd => "amd",
        }
    }
}

/// Which GPU telemetry strategy is active until the next resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpuProviderKind {
    NativeVendor(GpuVendor),
    #[default]
    HeuristicFallback,
}

impl std::fmt::Display for GpuProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuProviderKind::NativeVendor(vendor) => write!(f, "{}", vendor.label()),
            GpuProviderKind::HeuristicFallback => write!(f, "fallback"),
        }
    }
}

/// Whether a GPU reading came from a vendor tool or from the process-list estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpuFidelity {
    Measured,
    #[default]
    Estimated,
}

/// Normalized GPU reading.
///
/// Construct through [`GpuReading::new`], which enforces `usage_percent` in
/// `[0, 100]` and `memory_used_bytes <= memory_total_bytes`. A temperature
/// the sensor could not report is `None`, never a made-up number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuReading {
    pub usage_percent: f32,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub temperature_celsius: Option<f32>,
    pub process_count: u32,
}

impl GpuReading {
    pub fn new(
        usage_percent: f32,
        memory_used_bytes: u64,
        memory_total_bytes: u64,
        temperature_celsius: Option<f32>,
        process_count: u32,
    ) -> Self {
        Self {
            usage_percent: clamp_percent(usage_percent),
            memory_used_bytes: memory_used_bytes.min(memory_total_bytes),
            memory_total_bytes,
            temperature_celsius: temperature_celsius.filter(|t| t.is_finite()),
            process_count,
        }
    }

    pub fn memory_percent(&self) -> f32 {
        percent_of(self.memory_used_bytes, self.memory_total_bytes)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuSnapshot {
    pub kind: GpuProviderKind,
    pub fidelity: GpuFidelity,
    pub reading: GpuReading,
}

/// Clamp to `[0, 100]`, mapping NaN to 0.
pub fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

fn percent_of(part: u64, whole: u64) -> f32 {
    if whole > 0 {
        clamp_percent((part as f64 / whole as f64 * 100.0) as f32)
    } else {
        0.0
    }
}
