//! The seam to the platform camera.
//!
//! The manager and capturer are written against these traits; the synthetic
//! camera in [`crate::synthetic`] is the in-process implementation used by
//! the CLI and the tests. A platform backend (V4L2, AVFoundation, a browser
//! bridge) plugs in here without touching the rest of the pipeline.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CameraError;

/// One decoded frame from a live stream, tightly packed RGB8.
#[derive(Debug, Clone)]
pub struct PixelFrame {
    pub width: u32,
    pub height: u32,
    /// `width * height * 3` bytes, row-major.
    pub rgb: Vec<u8>,
}

/// A single producer inside a live camera stream.
///
/// Tracks must each be explicitly stopped on teardown; `stop` is
/// idempotent.
pub trait MediaTrack: Send + Sync {
    /// Track kind, e.g. `"video"`.
    fn kind(&self) -> &str;

    /// Human-readable device label.
    fn label(&self) -> &str;

    /// `true` until the track has been stopped.
    fn is_live(&self) -> bool;

    fn stop(&self);
}

/// A live media stream bound to the camera device.
#[async_trait]
pub trait MediaStream: Send + Sync {
    /// All tracks carried by this stream.
    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>>;

    /// Native pixel dimensions. `(0, 0)` until the first frame has been
    /// decoded — the readiness fallback probe keys off this.
    fn dimensions(&self) -> (u32, u32);

    /// Start playback.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::PlaybackFailed`] when the stream cannot start.
    fn play(&self) -> Result<(), CameraError>;

    /// Resolves once the stream has decoded its first frame. The platform
    /// may never deliver this notification, so callers must not await it
    /// without a competing timed probe.
    async fn decoded(&self);

    /// The most recently decoded frame, or `None` before the first decode.
    fn latest_frame(&self) -> Option<PixelFrame>;
}

/// A camera device that can be probed and opened.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Lightweight permission probe; acquires no stream.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::PermissionDenied`] or [`CameraError::NoDevice`]
    /// when the device would refuse a subsequent [`CameraDevice::open`].
    async fn probe_permission(&self) -> Result<(), CameraError>;

    /// Request the device and return a live stream.
    ///
    /// # Errors
    ///
    /// Returns a [`CameraError`] describing why the device could not be
    /// acquired.
    async fn open(&self) -> Result<Arc<dyn MediaStream>, CameraError>;
}
