//! In-process camera used by the CLI and the test suite.
//!
//! Produces a moving test-pattern raster and can be configured to misbehave
//! in every way the manager has to survive: denied permission, missing or
//! busy hardware, playback failure, a decode notification that never
//! arrives, and a stream that never produces pixels at all.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::device::{CameraDevice, MediaStream, MediaTrack, PixelFrame};
use crate::error::CameraError;

/// How a [`SyntheticCamera`] behaves across probe, open, and decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Opens normally; the decoded notification fires after the decode delay.
    Nominal,
    /// Permission probe and open both refuse access.
    Denied,
    /// No device present.
    Missing,
    /// Permission probe passes but the device is held by another consumer.
    Busy,
    /// Playback cannot start on the acquired stream.
    PlaybackFailure,
    /// Pixels arrive (dimensions become nonzero) but the decoded
    /// notification is never delivered — only the timed probe can confirm
    /// readiness.
    MuteDecodeSignal,
    /// The stream never decodes anything; dimensions stay zero.
    NeverDecodes,
}

const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_OPEN_DELAY: Duration = Duration::from_millis(50);
const DEFAULT_DECODE_DELAY: Duration = Duration::from_millis(120);

pub struct SyntheticCamera {
    behavior: Behavior,
    width: u32,
    height: u32,
    open_delay: Duration,
    decode_delay: Duration,
    /// Handle onto the most recently opened stream, so tests can observe
    /// track teardown for attempts that were superseded before binding.
    last_stream: Mutex<Option<Arc<SyntheticStream>>>,
}

impl SyntheticCamera {
    /// A well-behaved camera with the given native resolution.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            behavior: Behavior::Nominal,
            width,
            height,
            open_delay: DEFAULT_OPEN_DELAY,
            decode_delay: DEFAULT_DECODE_DELAY,
            last_stream: Mutex::new(None),
        }
    }

    /// A camera with the default resolution and the given behavior.
    #[must_use]
    pub fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            ..Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
        }
    }

    /// Overrides the simulated permission-prompt delay before `open` resolves.
    #[must_use]
    pub fn open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    /// Overrides the delay before the stream decodes its first frame.
    #[must_use]
    pub fn decode_delay(mut self, delay: Duration) -> Self {
        self.decode_delay = delay;
        self
    }

    /// The most recently opened stream, if any.
    #[must_use]
    pub fn last_stream(&self) -> Option<Arc<SyntheticStream>> {
        self.last_stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CameraDevice for SyntheticCamera {
    async fn probe_permission(&self) -> Result<(), CameraError> {
        match self.behavior {
            Behavior::Denied => Err(CameraError::PermissionDenied),
            Behavior::Missing => Err(CameraError::NoDevice),
            _ => Ok(()),
        }
    }

    async fn open(&self) -> Result<Arc<dyn MediaStream>, CameraError> {
        tokio::time::sleep(self.open_delay).await;
        match self.behavior {
            Behavior::Denied => Err(CameraError::PermissionDenied),
            Behavior::Missing => Err(CameraError::NoDevice),
            Behavior::Busy => Err(CameraError::DeviceBusy),
            _ => {
                let stream = Arc::new(SyntheticStream {
                    behavior: self.behavior,
                    width: self.width,
                    height: self.height,
                    opened_at: tokio::time::Instant::now(),
                    decode_delay: self.decode_delay,
                    track: Arc::new(SyntheticTrack {
                        label: "synthetic test pattern".to_owned(),
                        live: AtomicBool::new(true),
                    }),
                });
                *self
                    .last_stream
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&stream));
                Ok(stream)
            }
        }
    }
}

pub struct SyntheticStream {
    behavior: Behavior,
    width: u32,
    height: u32,
    opened_at: tokio::time::Instant,
    decode_delay: Duration,
    track: Arc<SyntheticTrack>,
}

impl SyntheticStream {
    fn has_decoded(&self) -> bool {
        match self.behavior {
            Behavior::NeverDecodes => false,
            _ => self.opened_at.elapsed() >= self.decode_delay,
        }
    }
}

#[async_trait]
impl MediaStream for SyntheticStream {
    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        vec![Arc::clone(&self.track) as Arc<dyn MediaTrack>]
    }

    fn dimensions(&self) -> (u32, u32) {
        if self.has_decoded() {
            (self.width, self.height)
        } else {
            (0, 0)
        }
    }

    fn play(&self) -> Result<(), CameraError> {
        match self.behavior {
            Behavior::PlaybackFailure => Err(CameraError::PlaybackFailed(
                "decoder rejected the stream".to_owned(),
            )),
            _ => Ok(()),
        }
    }

    async fn decoded(&self) {
        match self.behavior {
            Behavior::Nominal => {
                tokio::time::sleep_until(self.opened_at + self.decode_delay).await;
            }
            // The notification is simply never delivered; the manager's
            // timed probe is the only way out.
            _ => std::future::pending::<()>().await,
        }
    }

    fn latest_frame(&self) -> Option<PixelFrame> {
        if !self.has_decoded() {
            return None;
        }
        Some(test_pattern(self.width, self.height))
    }
}

struct SyntheticTrack {
    label: String,
    live: AtomicBool,
}

impl MediaTrack for SyntheticTrack {
    fn kind(&self) -> &str {
        "video"
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

/// A horizontal/vertical gradient with a little sensor noise.
fn test_pattern(width: u32, height: u32) -> PixelFrame {
    let mut rng = rand::rng();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = ((x * 255) / width.max(1)) as u8;
            let g = ((y * 255) / height.max(1)) as u8;
            rgb.push(r.saturating_add(rng.random_range(0..8)));
            rgb.push(g);
            rgb.push(128);
        }
    }
    PixelFrame { width, height, rgb }
}
