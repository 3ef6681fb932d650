//! The narrow bridge to the external 3D globe visualization.
//!
//! Exactly two things cross this boundary: an outbound one-shot "begin
//! zoom" signal and an inbound one-shot "zoom complete" callback. The
//! visualization itself is a black box — purely cosmetic from the
//! pipeline's perspective.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

/// Completion report from the visualization, tagged with the session epoch
/// the zoom was started under so late reports from a superseded zoom are
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomDone {
    pub epoch: u64,
}

/// One-shot completion token handed to the visualization with each zoom.
pub struct ZoomComplete {
    epoch: u64,
    tx: mpsc::UnboundedSender<ZoomDone>,
}

impl ZoomComplete {
    /// Reports the zoom as finished. Consuming `self` makes the token
    /// single-use; the receiving side additionally tolerates duplicate
    /// deliveries from a misbehaving visualization.
    pub fn complete(self) {
        let _ = self.tx.send(ZoomDone { epoch: self.epoch });
    }
}

/// The external visualization: accepts the start signal and reports back
/// through the token.
pub trait GlobeVisualization: Send + Sync {
    fn begin_zoom(&self, done: ZoomComplete);
}

/// Controller-side handle for the zoom transition.
pub struct GlobeTransitionBridge {
    visualization: Arc<dyn GlobeVisualization>,
    zooming: AtomicBool,
    tx: mpsc::UnboundedSender<ZoomDone>,
}

impl GlobeTransitionBridge {
    /// Returns the bridge and the receiver the session loop listens on for
    /// completion reports.
    #[must_use]
    pub fn new(
        visualization: Arc<dyn GlobeVisualization>,
    ) -> (Self, mpsc::UnboundedReceiver<ZoomDone>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                visualization,
                zooming: AtomicBool::new(false),
                tx,
            },
            rx,
        )
    }

    /// Signals the visualization to start zooming under the given epoch.
    pub fn begin_zoom(&self, epoch: u64) {
        self.zooming.store(true, Ordering::SeqCst);
        self.visualization.begin_zoom(ZoomComplete {
            epoch,
            tx: self.tx.clone(),
        });
    }

    /// Outbound flag: `true` between `begin_zoom` and `zoom_finished`.
    #[must_use]
    pub fn is_zooming(&self) -> bool {
        self.zooming.load(Ordering::SeqCst)
    }

    /// Clears the outbound flag once the session has consumed a completion.
    pub fn zoom_finished(&self) {
        self.zooming.store(false, Ordering::SeqCst);
    }
}

/// Timer-driven stand-in for the real globe: "animates" for a fixed
/// duration, then reports completion.
pub struct CosmeticGlobe {
    duration: Duration,
}

impl CosmeticGlobe {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl GlobeVisualization for CosmeticGlobe {
    fn begin_zoom(&self, done: ZoomComplete) {
        let duration = self.duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            done.complete();
        });
    }
}
