//! Periodic sampling of every metric source.
//!
//! One [`SampleScheduler`] runs per process. It owns all mutable monitor state
//! and is the only writer; the presentation layer sees immutable frames through
//! the [`SnapshotPublisher`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};

use crate::core::config::Config;
use crate::error::{Result, SysdashError};
use crate::platform::command::CommandRunner;

use super::gpu::GpuSource;
use super::history::{MetricHistory, Series};
use super::host::{panic_message, HostMetrics, MetricSource, SourceHealth};
use super::metrics::*;
use super::network::NetworkRateCalculator;
use super::publisher::SnapshotPublisher;
use super::resolver::GpuProviderResolver;

/// Longest sleep after a failed tick, whatever the multiplier
pub const MAX_BACKOFF: Duration = Duration::from_secs(60 * 60);

/// Most vendor-tool calls made in one loop step: a native GPU read or a
/// provider resolution each run two
const PROBE_CALLS_PER_STEP: u32 = 2;

/// Slack for the non-probe part of a step
const STEP_OVERHEAD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub interval: Duration,
    /// The sleep after a failed tick is `interval * backoff_multiplier`
    pub backoff_multiplier: u32,
    pub probe_timeout: Duration,
    pub history_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SchedulerConfig {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.interval(),
            backoff_multiplier: config.backoff_multiplier.max(1),
            probe_timeout: config.probe_timeout(),
            history_capacity: config.history_capacity(),
        }
    }
}

impl SchedulerConfig {
    /// Upper bound on how long the step in progress can take to finish.
    pub fn shutdown_grace(&self) -> Duration {
        self.probe_timeout
            .saturating_mul(PROBE_CALLS_PER_STEP)
            .saturating_add(STEP_OVERHEAD)
    }

    pub fn backoff(&self) -> Duration {
        self.interval
            .checked_mul(self.backoff_multiplier)
            .map_or(MAX_BACKOFF, |backoff| backoff.min(MAX_BACKOFF))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Ticking,
}

/// Requests from outside the sampling task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Re-run GPU provider resolution before the next tick
    RestartGpu,
}

/// Mutable state carried from one tick to the next
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub history: MetricHistory,
    pub network: NetworkRateCalculator,
    pub gpu_kind: GpuProviderKind,
    pub health: SourceHealth,
    pub ticks: u64,
}

impl MonitorState {
    fn new(history_capacity: usize) -> Self {
        Self {
            history: MetricHistory::with_capacity(history_capacity),
            network: NetworkRateCalculator::new(),
            gpu_kind: GpuProviderKind::HeuristicFallback,
            health: SourceHealth::default(),
            ticks: 0,
        }
    }
}

enum LoopEvent {
    Stop,
    Control(ControlCommand),
    Tick,
}

pub struct SampleScheduler {
    host: Box<dyn HostMetrics>,
    gpu: GpuSource,
    resolver: GpuProviderResolver,
    publisher: SnapshotPublisher,
    config: SchedulerConfig,
    state: MonitorState,
    phase: SchedulerState,
}

impl SampleScheduler {
    pub fn new(
        host: Box<dyn HostMetrics>,
        runner: Arc<dyn CommandRunner>,
        publisher: SnapshotPublisher,
        config: SchedulerConfig,
    ) -> Self {
        let resolver = GpuProviderResolver::new(runner.clone(), config.probe_timeout);
        let gpu = GpuSource::new(runner, resolver.timeout());

        Self {
            host,
            gpu,
            resolver,
            publisher,
            state: MonitorState::new(config.history_capacity),
            config,
            phase: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn phase(&self) -> SchedulerState {
        self.phase
    }

    pub fn gpu_kind(&self) -> GpuProviderKind {
        self.state.gpu_kind
    }

    /// Probe vendor tools and switch the GPU source to whatever answers.
    pub async fn resolve_gpu(&mut self) -> GpuProviderKind {
        let kind = self.resolver.resolve().await;
        if kind != self.state.gpu_kind {
            log::info!("GPU provider: {} -> {}", self.state.gpu_kind, kind);
        }
        self.state.gpu_kind = kind;
        kind
    }

    /// Take a first reading of the interface counters so the first tick
    /// reports a rate instead of 0.
    pub fn seed_network(&mut self, now: Instant) {
        let host = self.host.as_mut();
        if let Reading::Available(counters) = self
            .state
            .health
            .sample(MetricSource::Network, || host.network_counters())
        {
            self.state.network = NetworkRateCalculator::seeded(counters, now);
        }
    }

    pub async fn tick(&mut self) -> Result<()> {
        self.tick_at(Instant::now()).await
    }

    /// Run one full sampling cycle as of `now` and publish the result.
    ///
    /// A failing source only marks its own fields unavailable. An `Err` means
    /// the process is short on resources and the caller should back off; the
    /// frame for this tick has been published regardless.
    pub async fn tick_at(&mut self, now: Instant) -> Result<()> {
        self.phase = SchedulerState::Ticking;
        let host = self.host.as_mut();
        let health = &mut self.state.health;

        let cpu = health.sample(MetricSource::Cpu, || host.cpu());
        let memory = health.sample(MetricSource::Memory, || host.memory());
        let disk = health.sample(MetricSource::Disk, || host.disk());
        let network = match health.sample(MetricSource::Network, || host.network_counters()) {
            Reading::Available(counters) => {
                Reading::Available(self.state.network.compute_rates(counters, now))
            }
            Reading::Unavailable { reason } => Reading::Unavailable { reason },
        };

        let gpu = self
            .gpu
            .sample(self.state.gpu_kind, host, memory.value())
            .await;

        let history = &mut self.state.history;
        history.append(Series::Cpu, cpu.map(|c| c.usage_percent).unwrap_or(0.0));
        history.append(Series::Gpu, gpu.snapshot.reading.usage_percent);
        history.append(
            Series::Memory,
            memory.map(|m| m.usage_percent).unwrap_or(0.0),
        );
        history.append(
            Series::Upload,
            network.map(|n| n.upload_bytes_per_sec as f32).unwrap_or(0.0),
        );
        history.append(
            Series::Download,
            network
                .map(|n| n.download_bytes_per_sec as f32)
                .unwrap_or(0.0),
        );

        let snapshot = MetricSnapshot {
            timestamp: chrono::Utc::now().timestamp(),
            cpu,
            memory,
            disk,
            network,
            gpu: gpu.snapshot,
        };
        self.publisher.publish(snapshot, self.state.history.clone());
        self.state.ticks += 1;
        self.phase = SchedulerState::Idle;

        match gpu.fault {
            Some(fault) if fault.is_resource_exhaustion() => {
                Err(SysdashError::resource_exhausted(fault.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Sample until `shutdown` fires or its sender is dropped.
    ///
    /// A tick in progress always completes before the loop exits.
    pub async fn run(
        mut self,
        mut control: mpsc::Receiver<ControlCommand>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        log::info!(
            "Sampling every {:?} (GPU provider: {})",
            self.config.interval,
            self.state.gpu_kind
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let event = tokio::select! {
                biased;
                _ = shutdown.recv() => LoopEvent::Stop,
                Some(cmd) = control.recv() => LoopEvent::Control(cmd),
                _ = ticker.tick() => LoopEvent::Tick,
            };

            match event {
                LoopEvent::Stop => break,
                LoopEvent::Control(ControlCommand::RestartGpu) => {
                    log::info!("Restarting GPU monitor...");
                    self.resolve_gpu().await;
                }
                LoopEvent::Tick => {
                    let failure = match AssertUnwindSafe(self.tick()).catch_unwind().await {
                        Ok(Ok(())) => None,
                        Ok(Err(e)) => Some(e.to_string()),
                        Err(payload) => Some(format!("tick panicked: {}", panic_message(payload.as_ref()))),
                    };

                    if let Some(reason) = failure {
                        self.phase = SchedulerState::Idle;
                        let backoff = self.config.backoff();
                        log::error!("Sampling failed, backing off for {:?}: {}", backoff, reason);

                        let stop = tokio::select! {
                            _ = tokio::time::sleep(backoff) => false,
                            _ = shutdown.recv() => true,
                        };
                        if stop {
                            break;
                        }
                        ticker.reset();
                    }
                }
            }
        }

        log::info!("Sampling stopped after {} ticks", self.state.ticks);
    }
}
