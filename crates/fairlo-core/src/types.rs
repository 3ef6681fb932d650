//! Core data model for the scan pipeline.
//!
//! These types cross crate boundaries: the camera crate produces
//! [`CapturedFrame`]s, the analysis crate produces [`ScanResult`]s, and the
//! flow crate owns the [`FlowState`] that the presentation layer renders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A best-effort device coordinate.
///
/// Resolved once per session and replaced wholesale on re-resolution, never
/// mutated field-by-field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Wire form consumed by the analysis service: `"<lat>,<lng>"` with six
    /// decimal places.
    #[must_use]
    pub fn wire_format(&self) -> String {
        format!("{:.6},{:.6}", self.lat, self.lng)
    }
}

/// Coordinate used whenever geolocation is unsupported, denied, or times
/// out (Jaipur). The pipeline never runs without a coordinate.
pub const FALLBACK_COORDINATE: Coordinate = Coordinate {
    lat: 26.9124,
    lng: 75.7873,
};

/// Outcome of the one-shot geolocation query.
///
/// Transitions from `Loading` to exactly one terminal value per session and
/// never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationStatus {
    Loading,
    Granted,
    Denied,
}

/// Camera lifecycle status, owned exclusively by the camera manager.
/// All other components treat it as read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraStatus {
    Uninitialized,
    Requesting,
    Ready,
    Error,
}

impl std::fmt::Display for CameraStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraStatus::Uninitialized => write!(f, "uninitialized"),
            CameraStatus::Requesting => write!(f, "requesting"),
            CameraStatus::Ready => write!(f, "ready"),
            CameraStatus::Error => write!(f, "error"),
        }
    }
}

/// The flow controller's single authoritative stage of the scan journey.
///
/// Exactly one state is active at a time; only the controller transitions
/// it. `Result` and `CameraDenied` are exitable by explicit user commands,
/// not terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Landing,
    Zooming,
    CameraActive,
    Capturing,
    Submitting,
    Result,
    CameraDenied,
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowState::Landing => write!(f, "landing"),
            FlowState::Zooming => write!(f, "zooming"),
            FlowState::CameraActive => write!(f, "camera_active"),
            FlowState::Capturing => write!(f, "capturing"),
            FlowState::Submitting => write!(f, "submitting"),
            FlowState::Result => write!(f, "result"),
            FlowState::CameraDenied => write!(f, "camera_denied"),
        }
    }
}

/// Fixed encoding for captured frames.
pub const FRAME_MIME: &str = "image/jpeg";

/// One encoded still frame from the live camera stream.
///
/// Created by the frame capturer and consumed exactly once by the
/// submission client; never cached and never re-submitted with the same
/// bytes.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Identifier tying log lines for one scan together.
    pub scan_id: Uuid,
    /// Encoded image payload.
    pub bytes: Vec<u8>,
    /// Always [`FRAME_MIME`].
    pub mime: &'static str,
    /// Source raster width in pixels.
    pub width: u32,
    /// Source raster height in pixels.
    pub height: u32,
    pub captured_at: DateTime<Utc>,
}

impl CapturedFrame {
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

/// The stable, fully-typed scan outcome.
///
/// Created only by the normalizer, immutable after creation, and discarded
/// when the flow resets to landing. `overprice_percentage` is always
/// recomputed from the resolved prices (see `fairlo-analysis`), never taken
/// from the raw payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub name: String,
    pub emoji: String,
    pub detected_price: f64,
    pub local_price: f64,
    pub currency: String,
    pub local_range: String,
    pub overprice_percentage: i32,
    pub insight: String,
    pub region: String,
}

impl ScanResult {
    /// Presentation classification of the price delta.
    #[must_use]
    pub fn deal_rating(&self) -> DealRating {
        if self.overprice_percentage > 20 {
            DealRating::Overpriced
        } else if self.overprice_percentage < -10 {
            DealRating::Underpriced
        } else {
            DealRating::Fair
        }
    }
}

/// Over/under-price classification rendered on the result card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealRating {
    Underpriced,
    Fair,
    Overpriced,
}

impl std::fmt::Display for DealRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DealRating::Underpriced => write!(f, "Great Deal"),
            DealRating::Fair => write!(f, "Fair Deal"),
            DealRating::Overpriced => write!(f, "Overpriced"),
        }
    }
}
