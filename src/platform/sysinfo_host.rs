//! [`HostMetrics`] backed by the sysinfo crate.

use std::path::{Path, PathBuf};

use sysinfo::{
    Components, CpuRefreshKind, Disks, MemoryRefreshKind, Networks, ProcessRefreshKind,
    ProcessesToUpdate, RefreshKind, System,
};

use crate::core::system_monitor::{
    CpuMetrics, DiskMetrics, HostMetrics, MemoryMetrics, NetworkCounters, ProcessSample,
};
use crate::error::{Result, SysdashError};

/// Sensor labels that belong to the CPU package on common platforms
const CPU_SENSOR_LABELS: [&str; 5] = ["cpu", "package", "tctl", "tdie", "core"];

pub struct SysinfoHost {
    system: System,
    components: Components,
    disks: Disks,
    networks: Networks,
    disk_mount: PathBuf,
}

impl SysinfoHost {
    pub fn new(disk_mount: impl Into<PathBuf>) -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything())
            .with_processes(ProcessRefreshKind::nothing().with_cpu().with_memory());

        Self {
            system: System::new_with_specifics(refresh_kind),
            components: Components::new_with_refreshed_list(),
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            disk_mount: disk_mount.into(),
        }
    }

    pub fn disk_mount(&self) -> &Path {
        &self.disk_mount
    }

    fn cpu_temperature(&mut self) -> Option<f32> {
        self.components.refresh(true);
        self.components
            .iter()
            .filter(|comp| {
                let label = comp.label().to_lowercase();
                CPU_SENSOR_LABELS.iter().any(|l| label.contains(l))
            })
            .filter_map(|comp| comp.temperature())
            .filter(|t| t.is_finite() && *t > 0.0)
            .reduce(f32::max)
    }
}

impl HostMetrics for SysinfoHost {
    fn cpu(&mut self) -> Result<CpuMetrics> {
        self.system.refresh_cpu_all();

        let cpus = self.system.cpus();
        if cpus.is_empty() {
            return Err(SysdashError::metric_collection("no CPUs reported"));
        }

        let frequency_mhz = cpus.first().map(|c| c.frequency()).unwrap_or(0);
        let logical_cores = cpus.len();
        let usage_percent = self.system.global_cpu_usage();

        Ok(CpuMetrics {
            usage_percent,
            frequency_mhz,
            physical_cores: System::physical_core_count(),
            logical_cores,
            temperature_celsius: self.cpu_temperature(),
        })
    }

    fn memory(&mut self) -> Result<MemoryMetrics> {
        self.system.refresh_memory();

        let total = self.system.total_memory();
        if total == 0 {
            return Err(SysdashError::metric_collection("total memory reported as 0"));
        }

        Ok(MemoryMetrics::from_totals(
            total,
            self.system.used_memory(),
            self.system.available_memory(),
        ))
    }

    fn disk(&mut self) -> Result<DiskMetrics> {
        self.disks.refresh(true);

        let disk = self
            .disks
            .iter()
            .find(|d| d.mount_point() == self.disk_mount)
            .ok_or_else(|| {
                SysdashError::metric_collection(format!(
                    "no disk mounted at {}",
                    self.disk_mount.display()
                ))
            })?;

        Ok(DiskMetrics::from_space(
            disk.mount_point().to_string_lossy(),
            disk.total_space(),
            disk.available_space(),
        ))
    }

    fn network_counters(&mut self) -> Result<NetworkCounters> {
        self.networks.refresh(true);

        Ok(self
            .networks
            .values()
            .fold(NetworkCounters::default(), |acc, data| NetworkCounters {
                sent: acc.sent.saturating_add(data.total_transmitted()),
                received: acc.received.saturating_add(data.total_received()),
            }))
    }

    fn processes(&mut self) -> Result<Vec<ProcessSample>> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        let total_memory = self.system.total_memory();
        Ok(self
            .system
            .processes()
            .values()
            .map(|proc| ProcessSample {
                name: proc.name().to_string_lossy().to_string(),
                cpu_percent: proc.cpu_usage(),
                memory_percent: if total_memory > 0 {
                    (proc.memory() as f32 / total_memory as f32) * 100.0
                } else {
                    0.0
                },
            })
            .collect())
    }
}
