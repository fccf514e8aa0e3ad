//! Single-slot handoff between the sampling task and the presentation layer.
//!
//! The slot always holds the most recent [`Frame`]. Publishing swaps the whole
//! frame at once, so a reader sees either the previous tick or the new one.

use std::sync::Arc;

use tokio::sync::watch;

use super::history::{MetricHistory, Series};
use super::metrics::MetricSnapshot;

/// Everything the presentation layer needs from one tick
#[derive(Debug, Clone)]
pub struct Frame {
    pub snapshot: Arc<MetricSnapshot>,
    pub history: MetricHistory,
}

pub struct SnapshotPublisher {
    tx: watch::Sender<Arc<Frame>>,
}

impl SnapshotPublisher {
    /// Create a publisher holding an empty frame, plus a first reader.
    pub fn new(history_capacity: usize) -> (Self, SnapshotReader) {
        let initial = Frame {
            snapshot: Arc::new(MetricSnapshot::default()),
            history: MetricHistory::with_capacity(history_capacity),
        };
        let (tx, rx) = watch::channel(Arc::new(initial));
        (Self { tx }, SnapshotReader { rx })
    }

    pub fn publish(&self, snapshot: MetricSnapshot, history: MetricHistory) {
        // send_replace succeeds even when every reader is gone
        self.tx.send_replace(Arc::new(Frame {
            snapshot: Arc::new(snapshot),
            history,
        }));
    }

    pub fn subscribe(&self) -> SnapshotReader {
        SnapshotReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read-only view of the latest published frame. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    rx: watch::Receiver<Arc<Frame>>,
}

impl SnapshotReader {
    pub fn latest(&self) -> Arc<MetricSnapshot> {
        self.rx.borrow().snapshot.clone()
    }

    pub fn frame(&self) -> Arc<Frame> {
        self.rx.borrow().clone()
    }

    /// Oldest to newest values of one series as of the latest frame
    pub fn series(&self, series: Series) -> Vec<f32> {
        self.rx.borrow().history.snapshot_series(series)
    }

    /// True if a frame was published since the last [`mark_seen`](Self::mark_seen)
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    pub fn mark_seen(&mut self) -> Arc<Frame> {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next frame. Returns false once the publisher is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
