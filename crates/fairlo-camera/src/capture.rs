//! Single still-frame capture from a ready stream.

use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;
use uuid::Uuid;

use fairlo_core::{CapturedFrame, FRAME_MIME};

use crate::device::MediaStream;

/// Fixed JPEG quality factor for captured frames.
pub const JPEG_QUALITY: u8 = 80;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The source reports zero dimensions or has no decoded frame. This is
    /// checked here regardless of what the camera status claims.
    #[error("capture unavailable: video source has no decoded frames")]
    CaptureUnavailable,

    #[error("frame encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Renders the stream's current frame at its native pixel dimensions and
/// encodes it as JPEG at [`JPEG_QUALITY`].
///
/// # Errors
///
/// - [`CaptureError::CaptureUnavailable`] when the source has nothing to
///   capture yet.
/// - [`CaptureError::Encode`] when the encoder rejects the raster.
pub fn capture_frame(stream: &dyn MediaStream) -> Result<CapturedFrame, CaptureError> {
    let (width, height) = stream.dimensions();
    if width == 0 || height == 0 {
        return Err(CaptureError::CaptureUnavailable);
    }

    let frame = stream.latest_frame().ok_or(CaptureError::CaptureUnavailable)?;

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    encoder.write_image(&frame.rgb, frame.width, frame.height, ExtendedColorType::Rgb8)?;

    let captured = CapturedFrame {
        scan_id: Uuid::new_v4(),
        bytes,
        mime: FRAME_MIME,
        width: frame.width,
        height: frame.height,
        captured_at: Utc::now(),
    };
    tracing::debug!(
        scan_id = %captured.scan_id,
        width = captured.width,
        height = captured.height,
        byte_len = captured.byte_len(),
        "frame captured"
    );
    Ok(captured)
}
