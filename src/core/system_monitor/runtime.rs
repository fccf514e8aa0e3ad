//! Tokio runtime hosting the background sampling task.
//!
//! The presentation layer keeps its own thread; it only talks to the sampler
//! through the [`SnapshotReader`], [`MonitorRuntime::restart_gpu`] and
//! [`MonitorRuntime::shutdown`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::core::config::Config;
use crate::platform::command::{CommandRunner, TokioCommandRunner};
use crate::platform::sysinfo_host::SysinfoHost;

use super::host::HostMetrics;
use super::publisher::{SnapshotPublisher, SnapshotReader};
use super::scheduler::{ControlCommand, SampleScheduler, SchedulerConfig};

/// Owns the sampling task. Dropping it stops sampling the same way
/// [`shutdown`](MonitorRuntime::shutdown) does.
pub struct MonitorRuntime {
    reader: SnapshotReader,
    shutdown_grace: Duration,
    control_tx: mpsc::Sender<ControlCommand>,
    shutdown_tx: broadcast::Sender<()>,
    worker: Option<JoinHandle<()>>,
    runtime: tokio::runtime::Runtime,
}

impl MonitorRuntime {
    /// Start sampling the real host.
    pub fn start(config: &Config) -> anyhow::Result<Self> {
        let host = SysinfoHost::new(config.disk_mount());
        Self::with_sources(config, Box::new(host), Arc::new(TokioCommandRunner), true)
    }

    /// Start sampling with the given sources.
    ///
    /// `warm_up` waits one sysinfo CPU interval before the first tick so CPU
    /// usage isn't reported as 0.
    pub fn with_sources(
        config: &Config,
        host: Box<dyn HostMetrics>,
        runner: Arc<dyn CommandRunner>,
        warm_up: bool,
    ) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("metrics-worker")
            .build()?;

        let scheduler_config = SchedulerConfig::from(config);
        let shutdown_grace = scheduler_config.shutdown_grace();
        let (publisher, reader) = SnapshotPublisher::new(scheduler_config.history_capacity);
        let mut scheduler = SampleScheduler::new(host, runner, publisher, scheduler_config);

        let (control_tx, control_rx) = mpsc::channel(4);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let shutdown_rx = shutdown_tx.subscribe();

        let worker = runtime.spawn(async move {
            scheduler.resolve_gpu().await;
            scheduler.seed_network(Instant::now());
            if warm_up {
                tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
            }
            scheduler.run(control_rx, shutdown_rx).await;
        });

        log::info!("MonitorRuntime initialized");

        Ok(Self {
            reader,
            shutdown_grace,
            control_tx,
            shutdown_tx,
            worker: Some(worker),
            runtime,
        })
    }

    pub fn reader(&self) -> SnapshotReader {
        self.reader.clone()
    }

    /// Ask the sampler to re-detect the GPU provider. False if it has stopped.
    pub fn restart_gpu(&self) -> bool {
        match self.control_tx.try_send(ControlCommand::RestartGpu) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::debug!("GPU restart already pending");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stop sampling, letting the current tick finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        log::info!("Shutting down MonitorRuntime");
        let _ = self.shutdown_tx.send(());

        let grace = self.shutdown_grace;
        let finished = self
            .runtime
            .block_on(async { tokio::time::timeout(grace, worker).await });
        if finished.is_err() {
            log::warn!("Sampler did not stop within {:?}", grace);
        }
        // Runtime will shutdown when dropped
    }
}

impl Drop for MonitorRuntime {
    fn drop(&mut self) {
        self.stop();
    }
}
