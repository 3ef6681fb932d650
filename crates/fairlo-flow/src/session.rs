//! The asynchronous session loop around the flow controller.
//!
//! Single-threaded in spirit: all state lives behind one event loop, and
//! every suspension point (permission probe, camera activation, the
//! auto-capture timer, the network submission, the zoom animation) reports
//! back as an event tagged with the controller epoch it was spawned under.
//! Stale events — anything outliving a reset or a scan-again — are dropped
//! at the loop boundary, so a slow response can never re-enter a state the
//! user has already left.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use fairlo_analysis::normalize::failure_result;
use fairlo_analysis::{normalize_outcome, RawScanResponse, ScanSubmissionClient, SubmissionError};
use fairlo_camera::{capture_frame, Activation, CameraError, CaptureError, DeviceCameraManager};
use fairlo_core::{CameraStatus, FlowState, ScanResult};

use crate::controller::{Command, Effect, ScanFlowController};
use crate::globe::{GlobeTransitionBridge, GlobeVisualization, ZoomDone};
use crate::location::{LocationProvider, ResolvedLocation};

/// Read model for the presentation layer.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub flow_state: FlowState,
    pub camera_status: CameraStatus,
    pub camera_error: Option<CameraError>,
    pub result: Option<ScanResult>,
    pub location: ResolvedLocation,
}

enum SessionEvent {
    Command(Command),
    PermissionProbed {
        epoch: u64,
        granted: bool,
    },
    CameraSettled {
        epoch: u64,
        outcome: Result<Activation, CameraError>,
    },
    AutoCapture {
        epoch: u64,
    },
    SubmissionSettled {
        epoch: u64,
        outcome: Result<RawScanResponse, SubmissionError>,
    },
    LocationResolved(ResolvedLocation),
    Shutdown,
}

/// Cloneable handle for issuing commands and observing session state.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionEvent>,
    snapshot_rx: watch::Receiver<Snapshot>,
}

impl SessionHandle {
    pub fn start_scan(&self) {
        self.command(Command::StartScan);
    }

    pub fn capture_now(&self) {
        self.command(Command::CaptureNow);
    }

    pub fn reset(&self) {
        self.command(Command::Reset);
    }

    pub fn retry_camera(&self) {
        self.command(Command::RetryCamera);
    }

    /// Ends the session loop; the camera is released on the way out.
    pub fn shutdown(&self) {
        let _ = self.tx.send(SessionEvent::Shutdown);
    }

    fn command(&self, command: Command) {
        let _ = self.tx.send(SessionEvent::Command(command));
    }

    /// The latest published state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Waits until the published state satisfies `predicate` and returns it.
    /// Returns the last observed state if the session ends first.
    pub async fn wait_until<F>(&mut self, predicate: F) -> Snapshot
    where
        F: Fn(&Snapshot) -> bool,
    {
        loop {
            {
                let current = self.snapshot_rx.borrow_and_update();
                if predicate(&current) {
                    return current.clone();
                }
            }
            if self.snapshot_rx.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }
}

/// One scan session: owns the controller and wires it to the camera
/// manager, the submission client, and the globe bridge.
pub struct ScanSession {
    controller: ScanFlowController,
    camera: Arc<DeviceCameraManager>,
    client: Arc<ScanSubmissionClient>,
    bridge: GlobeTransitionBridge,
    zoom_rx: mpsc::UnboundedReceiver<ZoomDone>,
    location_provider: Option<LocationProvider>,
    location: ResolvedLocation,
    auto_capture_delay: Duration,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    snapshot_tx: watch::Sender<Snapshot>,
}

impl ScanSession {
    #[must_use]
    pub fn new(
        camera: Arc<DeviceCameraManager>,
        client: Arc<ScanSubmissionClient>,
        visualization: Arc<dyn GlobeVisualization>,
        location_provider: LocationProvider,
        auto_capture_delay: Duration,
    ) -> (Self, SessionHandle) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (bridge, zoom_rx) = GlobeTransitionBridge::new(visualization);
        let initial = Snapshot {
            flow_state: FlowState::Landing,
            camera_status: CameraStatus::Uninitialized,
            camera_error: None,
            result: None,
            location: ResolvedLocation::loading(),
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let handle = SessionHandle {
            tx: events_tx.clone(),
            snapshot_rx,
        };
        let session = Self {
            controller: ScanFlowController::new(),
            camera,
            client,
            bridge,
            zoom_rx,
            location_provider: Some(location_provider),
            location: ResolvedLocation::loading(),
            auto_capture_delay,
            events_tx,
            events_rx,
            snapshot_tx,
        };
        (session, handle)
    }

    /// Runs the event loop until [`SessionHandle::shutdown`] is called.
    pub async fn run(mut self) {
        // Location resolution runs alongside the landing view; nothing in
        // the pipeline blocks on it.
        if let Some(provider) = self.location_provider.take() {
            let tx = self.events_tx.clone();
            tokio::spawn(async move {
                let resolved = provider.resolve().await;
                let _ = tx.send(SessionEvent::LocationResolved(resolved));
            });
        }
        self.publish();

        loop {
            tokio::select! {
                Some(event) = self.events_rx.recv() => {
                    if matches!(event, SessionEvent::Shutdown) {
                        break;
                    }
                    self.handle_event(event);
                }
                Some(done) = self.zoom_rx.recv() => self.handle_zoom_done(done),
                else => break,
            }
            self.publish();
        }

        // Scoped release: the stream never outlives the session.
        self.camera.deactivate();
        self.publish();
        tracing::info!("scan session ended");
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Command(command) => {
                let effects = match command {
                    Command::StartScan => self.controller.start_scan(),
                    Command::CaptureNow => self.controller.capture_now(),
                    Command::Reset => self.controller.reset(),
                    Command::RetryCamera => self.controller.retry_camera(),
                };
                self.apply(&effects);
            }
            SessionEvent::PermissionProbed { epoch, granted } => {
                if self.is_stale(epoch, "permission probe") {
                    return;
                }
                let effects = self.controller.permission_probed(granted);
                self.apply(&effects);
            }
            SessionEvent::CameraSettled { epoch, outcome } => {
                if self.is_stale(epoch, "camera activation") {
                    return;
                }
                match outcome {
                    Ok(Activation::Ready) => {
                        let effects = self.controller.camera_ready();
                        self.apply(&effects);
                    }
                    // The manager already released the superseded stream.
                    Ok(Activation::Superseded) => {}
                    Err(err) => {
                        tracing::warn!(error = %err, "camera activation failed");
                        let effects = self.controller.camera_failed();
                        self.apply(&effects);
                    }
                }
            }
            SessionEvent::AutoCapture { epoch } => {
                if self.is_stale(epoch, "auto-capture timer") {
                    return;
                }
                let effects = self.controller.capture_now();
                self.apply(&effects);
            }
            SessionEvent::SubmissionSettled { epoch, outcome } => {
                if self.is_stale(epoch, "submission") {
                    return;
                }
                let card = normalize_outcome(outcome);
                self.controller.settle_result(card);
            }
            SessionEvent::LocationResolved(resolved) => {
                self.location = resolved;
            }
            // Consumed by the run loop before dispatch.
            SessionEvent::Shutdown => {}
        }
    }

    fn handle_zoom_done(&mut self, done: ZoomDone) {
        if self.is_stale(done.epoch, "zoom completion") {
            return;
        }
        self.bridge.zoom_finished();
        let effects = self.controller.zoom_completed();
        self.apply(&effects);
    }

    fn apply(&mut self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::ProbePermission => {
                    let epoch = self.controller.epoch();
                    let camera = Arc::clone(&self.camera);
                    let tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        let granted = match camera.probe_permission().await {
                            Ok(()) => true,
                            Err(err) => {
                                tracing::warn!(error = %err, "camera permission probe failed");
                                false
                            }
                        };
                        let _ = tx.send(SessionEvent::PermissionProbed { epoch, granted });
                    });
                }
                Effect::BeginZoom => self.bridge.begin_zoom(self.controller.epoch()),
                Effect::ActivateCamera => {
                    let epoch = self.controller.epoch();
                    let camera = Arc::clone(&self.camera);
                    let tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        let outcome = camera.activate().await;
                        let _ = tx.send(SessionEvent::CameraSettled { epoch, outcome });
                    });
                }
                Effect::ArmAutoCapture => {
                    let epoch = self.controller.epoch();
                    let delay = self.auto_capture_delay;
                    let tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(SessionEvent::AutoCapture { epoch });
                    });
                }
                Effect::CaptureFrame => self.capture_and_submit(),
                Effect::DeactivateCamera => self.camera.deactivate(),
            }
        }
    }

    /// Capture is synchronous; the submission it feeds is spawned with the
    /// current epoch. A capture failure settles the failure card directly —
    /// the user reaches the result view either way.
    fn capture_and_submit(&mut self) {
        let captured = match self.camera.stream() {
            Some(stream) => capture_frame(stream.as_ref()),
            None => Err(CaptureError::CaptureUnavailable),
        };
        match captured {
            Ok(frame) => {
                if self.controller.frame_captured() {
                    let epoch = self.controller.epoch();
                    let client = Arc::clone(&self.client);
                    let location = self.location.coordinate;
                    let tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        let outcome = client.submit(frame, location).await;
                        let _ = tx.send(SessionEvent::SubmissionSettled { epoch, outcome });
                    });
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "frame capture failed");
                self.controller
                    .settle_result(failure_result("We couldn't capture a frame from the camera."));
            }
        }
    }

    fn is_stale(&self, epoch: u64, what: &str) -> bool {
        let current = self.controller.epoch();
        if epoch == current {
            false
        } else {
            tracing::debug!(epoch, current, what, "stale completion dropped");
            true
        }
    }

    fn publish(&self) {
        let snapshot = Snapshot {
            flow_state: self.controller.state(),
            camera_status: self.camera.status(),
            camera_error: self.camera.last_error(),
            result: self.controller.result().cloned(),
            location: self.location,
        };
        let _ = self.snapshot_tx.send(snapshot);
    }
}
