//! The scan flow state machine.
//!
//! Exactly one [`FlowState`] is active at a time and only this controller
//! transitions it. Commands come from the presentation layer; everything
//! else arrives as component events (permission probed, zoom complete,
//! camera settled, submission settled) that the controller interprets.
//! The controller returns [`Effect`]s for the session loop to perform —
//! it never touches the camera, network, or globe itself, which keeps the
//! whole transition table synchronously testable.

use fairlo_core::{FlowState, ScanResult};

/// The four commands accepted from the presentation layer.
///
/// `StartScan` doubles as "scan again" when issued from the result card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartScan,
    CaptureNow,
    Reset,
    RetryCamera,
}

/// Side effects requested from the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Run the camera permission probe and report back.
    ProbePermission,
    /// Signal the globe visualization to start its zoom.
    BeginZoom,
    /// Activate the camera manager and report the settled outcome.
    ActivateCamera,
    /// Start the auto-capture timer.
    ArmAutoCapture,
    /// Capture one frame from the ready stream and submit it.
    CaptureFrame,
    /// Stop the camera stream synchronously.
    DeactivateCamera,
}

pub struct ScanFlowController {
    state: FlowState,
    result: Option<ScanResult>,
    /// `true` once the camera manager has reported ready for the current
    /// camera activation; cleared on every exit from the camera path.
    camera_ready: bool,
    /// Bumped on every user-initiated exit from an in-flight path. Async
    /// completions carry the epoch they were spawned under; the session
    /// loop drops any completion whose epoch is stale.
    epoch: u64,
}

impl Default for ScanFlowController {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanFlowController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: FlowState::Landing,
            result: None,
            camera_ready: false,
            epoch: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> FlowState {
        self.state
    }

    #[must_use]
    pub fn result(&self) -> Option<&ScanResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Start-scan command. From `Landing` this runs the permission probe;
    /// from `Result` it is the "scan again" path, which skips the landing
    /// UI and re-enters the zoom directly.
    pub fn start_scan(&mut self) -> Vec<Effect> {
        match self.state {
            FlowState::Landing => {
                tracing::info!("scan requested; probing camera permission");
                vec![Effect::ProbePermission]
            }
            FlowState::Result => {
                self.epoch += 1;
                self.result = None;
                self.camera_ready = false;
                self.transition(FlowState::Zooming);
                vec![Effect::DeactivateCamera, Effect::BeginZoom]
            }
            _ => self.ignore("start_scan"),
        }
    }

    /// Capture-now command, also issued by the auto-capture timer. Ignored
    /// unless the camera is active and ready — in particular, a capture
    /// requested while already submitting is a no-op, so at most one
    /// submission is ever in flight.
    pub fn capture_now(&mut self) -> Vec<Effect> {
        if self.state == FlowState::CameraActive && self.camera_ready {
            self.transition(FlowState::Capturing);
            vec![Effect::CaptureFrame]
        } else {
            self.ignore("capture_now")
        }
    }

    /// Reset command: back to the landing view from anywhere. Cancels the
    /// effect of any in-flight work (via the epoch bump), clears the stored
    /// result, and stops the camera synchronously.
    pub fn reset(&mut self) -> Vec<Effect> {
        if self.state == FlowState::Landing {
            return self.ignore("reset");
        }
        self.epoch += 1;
        self.result = None;
        self.camera_ready = false;
        self.transition(FlowState::Landing);
        vec![Effect::DeactivateCamera]
    }

    /// Retry-camera command from the denied view: a fresh, user-initiated
    /// activation attempt. Never issued automatically.
    pub fn retry_camera(&mut self) -> Vec<Effect> {
        if self.state == FlowState::CameraDenied {
            self.camera_ready = false;
            self.transition(FlowState::CameraActive);
            vec![Effect::ActivateCamera]
        } else {
            self.ignore("retry_camera")
        }
    }

    /// Outcome of the permission probe started by [`Self::start_scan`].
    pub fn permission_probed(&mut self, granted: bool) -> Vec<Effect> {
        if self.state != FlowState::Landing {
            return self.ignore("permission_probed");
        }
        if granted {
            self.transition(FlowState::Zooming);
            vec![Effect::BeginZoom]
        } else {
            self.transition(FlowState::CameraDenied);
            Vec::new()
        }
    }

    /// Zoom-complete report from the globe bridge. Only the first report
    /// per zoom is honored; duplicates are no-ops.
    pub fn zoom_completed(&mut self) -> Vec<Effect> {
        if self.state != FlowState::Zooming {
            return self.ignore("zoom_completed");
        }
        self.transition(FlowState::CameraActive);
        vec![Effect::ActivateCamera]
    }

    /// The camera manager settled ready for the current activation.
    pub fn camera_ready(&mut self) -> Vec<Effect> {
        if self.state != FlowState::CameraActive {
            return self.ignore("camera_ready");
        }
        self.camera_ready = true;
        vec![Effect::ArmAutoCapture]
    }

    /// The camera manager settled with an error. Device and permission
    /// errors share the denied view, which offers the retry command.
    pub fn camera_failed(&mut self) -> Vec<Effect> {
        if self.state != FlowState::CameraActive {
            return self.ignore("camera_failed");
        }
        self.camera_ready = false;
        self.transition(FlowState::CameraDenied);
        Vec::new()
    }

    /// A frame was captured; the session submits it.
    pub fn frame_captured(&mut self) -> bool {
        if self.state != FlowState::Capturing {
            self.ignore("frame_captured");
            return false;
        }
        self.transition(FlowState::Submitting);
        true
    }

    /// Terminal card for this scan — a normalized response or a synthetic
    /// failure card from a capture/submission error. Either way the user
    /// reaches the result view rather than a stuck spinner.
    pub fn settle_result(&mut self, card: ScanResult) {
        match self.state {
            FlowState::Capturing | FlowState::Submitting => {
                self.result = Some(card);
                self.transition(FlowState::Result);
            }
            _ => {
                self.ignore("settle_result");
            }
        }
    }

    fn transition(&mut self, to: FlowState) {
        tracing::info!(from = %self.state, to = %to, "flow transition");
        self.state = to;
    }

    fn ignore(&self, event: &str) -> Vec<Effect> {
        tracing::debug!(state = %self.state, event, "event ignored in current state");
        Vec::new()
    }
}
