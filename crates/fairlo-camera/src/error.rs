use thiserror::Error;

/// Errors surfaced by the camera device and lifecycle manager.
///
/// None of these are retried automatically — retry is a distinct,
/// user-initiated `activate()` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// The user (or platform policy) refused camera access.
    #[error("camera permission denied")]
    PermissionDenied,

    /// No camera device is present on this host.
    #[error("no camera device available")]
    NoDevice,

    /// A camera exists but another consumer holds it.
    #[error("camera device is busy")]
    DeviceBusy,

    /// The stream was acquired but playback could not start.
    #[error("video playback failed: {0}")]
    PlaybackFailed(String),

    /// Neither readiness signal fired within the fallback window.
    #[error("camera did not become ready within {waited_ms}ms")]
    Timeout { waited_ms: u64 },
}
