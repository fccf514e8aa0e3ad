use std::time::{Duration, Instant};

use super::metrics::{NetworkCounters, NetworkRates};

/// Below this the delta is dominated by timer noise.
const MIN_ELAPSED: Duration = Duration::from_millis(1);

/// Counters observed on the previous tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkCounterState {
    pub last_sent: u64,
    pub last_received: u64,
    pub last_sample_time: Instant,
}

/// Turns cumulative interface counters into per-second rates.
#[derive(Debug, Clone, Default)]
pub struct NetworkRateCalculator {
    state: Option<NetworkCounterState>,
}

impl NetworkRateCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from counters read at startup, so the first tick already yields a rate.
    pub fn seeded(counters: NetworkCounters, at: Instant) -> Self {
        Self {
            state: Some(NetworkCounterState {
                last_sent: counters.sent,
                last_received: counters.received,
                last_sample_time: at,
            }),
        }
    }

    pub fn state(&self) -> Option<&NetworkCounterState> {
        self.state.as_ref()
    }

    /// Rates since the previous call, using the real elapsed time.
    ///
    /// Counters that went backwards (interface reset, wraparound) count as no
    /// traffic. The state always moves to `current`.
    pub fn compute_rates(&mut self, current: NetworkCounters, now: Instant) -> NetworkRates {
        let rates = match self.state {
            Some(prev) => {
                let elapsed = now.saturating_duration_since(prev.last_sample_time);
                if elapsed < MIN_ELAPSED {
                    NetworkRates::default()
                } else {
                    let secs = elapsed.as_secs_f64();
                    NetworkRates {
                        upload_bytes_per_sec: current.sent.saturating_sub(prev.last_sent) as f64
                            / secs,
                        download_bytes_per_sec: current
                            .received
                            .saturating_sub(prev.last_received)
                            as f64
                            / secs,
                    }
                }
            }
            None => NetworkRates::default(),
        };

        self.state = Some(NetworkCounterState {
            last_sent: current.sent,
            last_received: current.received,
            last_sample_time: now,
        });

        rates
    }
}
