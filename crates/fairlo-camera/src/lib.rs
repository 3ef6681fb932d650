//! Camera-device lifecycle and still-frame capture.
//!
//! [`DeviceCameraManager`] is the exclusive owner of the live stream: it
//! requests the device, confirms readiness through two racing signals, and
//! guarantees teardown through an idempotent [`DeviceCameraManager::deactivate`].
//! [`capture_frame`] turns a ready stream into one JPEG-encoded
//! [`fairlo_core::CapturedFrame`].

pub mod capture;
pub mod device;
pub mod error;
pub mod manager;
pub mod synthetic;

pub use capture::{capture_frame, CaptureError, JPEG_QUALITY};
pub use device::{CameraDevice, MediaStream, MediaTrack, PixelFrame};
pub use error::CameraError;
pub use manager::{Activation, DeviceCameraManager};
pub use synthetic::{Behavior, SyntheticCamera};
