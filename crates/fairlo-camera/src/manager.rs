//! Lifecycle manager for the device camera.
//!
//! Owns the live media stream exclusively: every other component reads
//! [`CameraStatus`] and, through [`DeviceCameraManager::stream`], the frames
//! — nothing else may start or stop the stream.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use fairlo_core::CameraStatus;

use crate::device::{CameraDevice, MediaStream};
use crate::error::CameraError;

/// Outcome of one [`DeviceCameraManager::activate`] attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The stream is live and decoding; status is [`CameraStatus::Ready`].
    Ready,
    /// The attempt was overtaken by `deactivate()` or a newer `activate()`
    /// while it was suspended; any stream it acquired has been released and
    /// status was left to the overtaking call.
    Superseded,
}

struct Inner {
    status: CameraStatus,
    stream: Option<Arc<dyn MediaStream>>,
    last_error: Option<CameraError>,
    /// Monotonic activation-attempt id. Bumped by every `activate` and
    /// `deactivate`; continuations compare against it so late callbacks
    /// from a superseded attempt are dropped.
    attempt: u64,
}

pub struct DeviceCameraManager {
    device: Arc<dyn CameraDevice>,
    /// Delay before the dimension probe runs when the decoded notification
    /// has not arrived.
    ready_fallback: Duration,
    inner: Mutex<Inner>,
}

impl DeviceCameraManager {
    #[must_use]
    pub fn new(device: Arc<dyn CameraDevice>, ready_fallback: Duration) -> Self {
        Self {
            device,
            ready_fallback,
            inner: Mutex::new(Inner {
                status: CameraStatus::Uninitialized,
                stream: None,
                last_error: None,
                attempt: 0,
            }),
        }
    }

    #[must_use]
    pub fn status(&self) -> CameraStatus {
        self.lock().status
    }

    /// The most recent activation error, kept for rendering until the next
    /// attempt or deactivation.
    #[must_use]
    pub fn last_error(&self) -> Option<CameraError> {
        self.lock().last_error.clone()
    }

    /// The live stream, when status is [`CameraStatus::Ready`].
    #[must_use]
    pub fn stream(&self) -> Option<Arc<dyn MediaStream>> {
        self.lock().stream.clone()
    }

    /// Lightweight permission probe, delegated to the device.
    ///
    /// # Errors
    ///
    /// Propagates the device's refusal, typically
    /// [`CameraError::PermissionDenied`] or [`CameraError::NoDevice`].
    pub async fn probe_permission(&self) -> Result<(), CameraError> {
        self.device.probe_permission().await
    }

    /// Requests the camera, binds the stream, and confirms readiness.
    ///
    /// Readiness is confirmed by two independent signals racing to set the
    /// same terminal status: the stream's decoded notification, and a timed
    /// probe that checks for nonzero video dimensions after
    /// `ready_fallback`. Whichever fires first wins; the other becomes a
    /// no-op. Each suspension point re-checks the attempt id, so an
    /// activation overtaken by [`Self::deactivate`] (or a newer activation)
    /// releases its stream and reports [`Activation::Superseded`] without
    /// touching shared state.
    ///
    /// # Errors
    ///
    /// One of the [`CameraError`] codes; the same code is retained in
    /// [`Self::last_error`] and status becomes [`CameraStatus::Error`].
    /// Errors are never retried here — retry is a fresh `activate` call.
    pub async fn activate(&self) -> Result<Activation, CameraError> {
        let attempt = {
            let mut inner = self.lock();
            inner.attempt += 1;
            inner.status = CameraStatus::Requesting;
            inner.last_error = None;
            // A stream left over from an earlier attempt is released before
            // a new device request goes out.
            Self::release(inner.stream.take());
            inner.attempt
        };
        tracing::debug!(attempt, "requesting camera device");

        let stream = match self.device.open().await {
            Ok(stream) => stream,
            Err(err) => return self.settle_error(attempt, err),
        };

        // Bind, unless the attempt was overtaken while awaiting the device.
        {
            let mut inner = self.lock();
            if inner.attempt != attempt {
                drop(inner);
                Self::release(Some(stream));
                tracing::debug!(attempt, "activation superseded before binding");
                return Ok(Activation::Superseded);
            }
            inner.stream = Some(Arc::clone(&stream));
        }

        if let Err(err) = stream.play() {
            return self.settle_error(attempt, err);
        }

        let waited_ms = u64::try_from(self.ready_fallback.as_millis()).unwrap_or(u64::MAX);
        let readiness = tokio::select! {
            () = stream.decoded() => {
                tracing::debug!(attempt, "camera ready via decoded notification");
                Ok(())
            }
            () = tokio::time::sleep(self.ready_fallback) => {
                let (width, height) = stream.dimensions();
                if width > 0 && height > 0 {
                    tracing::debug!(attempt, width, height, "camera ready via dimension probe");
                    Ok(())
                } else {
                    Err(CameraError::Timeout { waited_ms })
                }
            }
        };

        match readiness {
            Ok(()) => {
                let mut inner = self.lock();
                if inner.attempt != attempt {
                    tracing::debug!(attempt, "activation superseded before readiness");
                    return Ok(Activation::Superseded);
                }
                inner.status = CameraStatus::Ready;
                Ok(Activation::Ready)
            }
            Err(err) => self.settle_error(attempt, err),
        }
    }

    /// Stops every track of any live stream and detaches it.
    ///
    /// Idempotent: safe to call repeatedly, before activation completes,
    /// and on teardown paths. Always leaves status at
    /// [`CameraStatus::Uninitialized`] and invalidates in-flight attempts.
    pub fn deactivate(&self) {
        let stream = {
            let mut inner = self.lock();
            inner.attempt += 1;
            inner.status = CameraStatus::Uninitialized;
            inner.last_error = None;
            inner.stream.take()
        };
        Self::release(stream);
    }

    /// Records a failed attempt, unless it has been superseded.
    fn settle_error(&self, attempt: u64, err: CameraError) -> Result<Activation, CameraError> {
        let stream = {
            let mut inner = self.lock();
            if inner.attempt != attempt {
                tracing::debug!(attempt, error = %err, "stale camera error dropped");
                return Ok(Activation::Superseded);
            }
            inner.status = CameraStatus::Error;
            inner.last_error = Some(err.clone());
            inner.stream.take()
        };
        Self::release(stream);
        tracing::warn!(attempt, error = %err, "camera activation failed");
        Err(err)
    }

    fn release(stream: Option<Arc<dyn MediaStream>>) {
        if let Some(stream) = stream {
            for track in stream.tracks() {
                track.stop();
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{Behavior, SyntheticCamera};

    fn manager_with(camera: SyntheticCamera, fallback: Duration) -> DeviceCameraManager {
        DeviceCameraManager::new(Arc::new(camera), fallback)
    }

    #[tokio::test(start_paused = true)]
    async fn activate_ready_via_decoded_notification() {
        let manager = manager_with(SyntheticCamera::new(640, 480), Duration::from_secs(5));
        let outcome = manager.activate().await.expect("activation should succeed");
        assert_eq!(outcome, Activation::Ready);
        assert_eq!(manager.status(), CameraStatus::Ready);
        assert!(manager.stream().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn activate_ready_via_dimension_probe_when_signal_is_mute() {
        let camera = SyntheticCamera::with_behavior(Behavior::MuteDecodeSignal)
            .decode_delay(Duration::from_millis(100));
        let manager = manager_with(camera, Duration::from_millis(500));
        let outcome = manager.activate().await.expect("activation should succeed");
        assert_eq!(outcome, Activation::Ready);
        assert_eq!(manager.status(), CameraStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn activate_times_out_when_nothing_decodes() {
        let camera = SyntheticCamera::with_behavior(Behavior::NeverDecodes);
        let manager = manager_with(camera, Duration::from_millis(500));
        let err = manager.activate().await.err().expect("activation should fail");
        assert_eq!(err, CameraError::Timeout { waited_ms: 500 });
        assert_eq!(manager.status(), CameraStatus::Error);
        assert_eq!(manager.last_error(), Some(err));
    }

    #[tokio::test(start_paused = true)]
    async fn activate_surfaces_permission_denied() {
        let camera = SyntheticCamera::with_behavior(Behavior::Denied);
        let manager = manager_with(camera, Duration::from_secs(5));
        let err = manager.activate().await.err().expect("activation should fail");
        assert_eq!(err, CameraError::PermissionDenied);
        assert_eq!(manager.status(), CameraStatus::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn activate_surfaces_playback_failure_and_stops_tracks() {
        let camera = Arc::new(SyntheticCamera::with_behavior(Behavior::PlaybackFailure));
        let manager = DeviceCameraManager::new(
            Arc::clone(&camera) as Arc<dyn CameraDevice>,
            Duration::from_secs(5),
        );
        let err = manager.activate().await.err().expect("activation should fail");
        assert!(matches!(err, CameraError::PlaybackFailed(_)));
        let stream = camera.last_stream().expect("stream was opened");
        assert!(stream.tracks().iter().all(|t| !t.is_live()));
    }

    #[tokio::test(start_paused = true)]
    async fn deactivate_twice_is_idempotent() {
        let manager = manager_with(SyntheticCamera::new(640, 480), Duration::from_secs(5));
        manager.activate().await.expect("activation should succeed");
        manager.deactivate();
        manager.deactivate();
        assert_eq!(manager.status(), CameraStatus::Uninitialized);
        assert!(manager.stream().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn deactivate_stops_every_track() {
        let camera = Arc::new(SyntheticCamera::new(640, 480));
        let manager = DeviceCameraManager::new(
            Arc::clone(&camera) as Arc<dyn CameraDevice>,
            Duration::from_secs(5),
        );
        manager.activate().await.expect("activation should succeed");
        let stream = camera.last_stream().expect("stream was opened");
        assert!(stream.tracks().iter().all(|t| t.is_live()));
        manager.deactivate();
        assert!(stream.tracks().iter().all(|t| !t.is_live()));
    }

    #[tokio::test(start_paused = true)]
    async fn deactivate_during_activation_supersedes_it() {
        let camera = Arc::new(SyntheticCamera::new(640, 480).open_delay(Duration::from_millis(50)));
        let manager = Arc::new(DeviceCameraManager::new(
            Arc::clone(&camera) as Arc<dyn CameraDevice>,
            Duration::from_secs(5),
        ));

        let task = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.activate().await })
        };
        // Let the activation reach the device-open suspension point.
        tokio::time::sleep(Duration::from_millis(1)).await;
        manager.deactivate();

        let outcome = task.await.expect("task should not panic");
        assert_eq!(outcome, Ok(Activation::Superseded));
        assert_eq!(manager.status(), CameraStatus::Uninitialized);
        // The stream acquired by the superseded attempt was released.
        let stream = camera.last_stream().expect("stream was opened");
        assert!(stream.tracks().iter().all(|t| !t.is_live()));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_denied_is_a_fresh_attempt() {
        let manager = manager_with(SyntheticCamera::with_behavior(Behavior::Busy), Duration::from_secs(5));
        let first = manager.activate().await;
        assert_eq!(first, Err(CameraError::DeviceBusy));
        let second = manager.activate().await;
        assert_eq!(second, Err(CameraError::DeviceBusy));
        assert_eq!(manager.status(), CameraStatus::Error);
    }
}
