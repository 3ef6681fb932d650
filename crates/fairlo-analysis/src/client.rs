//! HTTP client for the remote pricing service.
//!
//! One multipart POST per submission: the encoded frame under `image` and
//! the coordinate under `location` as `"<lat>,<lng>"`. Deliberately no
//! retries and no timeout override beyond the transport default — the
//! single-attempt semantics keep the flow's `submitting` state bounded.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};

use fairlo_core::{CapturedFrame, Coordinate};

use crate::error::SubmissionError;
use crate::types::RawScanResponse;

/// Client for the scan analysis endpoint.
///
/// Use [`ScanSubmissionClient::new`] with the configured endpoint; tests
/// point it at a wiremock server.
pub struct ScanSubmissionClient {
    client: Client,
    endpoint: Url,
}

impl ScanSubmissionClient {
    /// Creates a client for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::InvalidEndpoint`] if `endpoint` is not a
    /// valid URL, or [`SubmissionError::NetworkUnreachable`] if the
    /// underlying `reqwest::Client` cannot be constructed.
    pub fn new(
        endpoint: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, SubmissionError> {
        let endpoint = Url::parse(endpoint).map_err(|e| SubmissionError::InvalidEndpoint {
            url: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, endpoint })
    }

    /// Submits one captured frame plus the session coordinate.
    ///
    /// Consumes the frame: the same bytes are never re-submitted.
    ///
    /// # Errors
    ///
    /// - [`SubmissionError::NetworkUnreachable`] on transport failure.
    /// - [`SubmissionError::ServerError`] on any non-2xx status.
    /// - [`SubmissionError::MalformedResponse`] when the body is not JSON.
    pub async fn submit(
        &self,
        frame: CapturedFrame,
        location: Coordinate,
    ) -> Result<RawScanResponse, SubmissionError> {
        let scan_id = frame.scan_id;
        let byte_len = frame.byte_len();
        tracing::info!(%scan_id, byte_len, "submitting frame for analysis");

        let image = Part::bytes(frame.bytes)
            .file_name("scan.jpg")
            .mime_str(frame.mime)?;
        let form = Form::new()
            .part("image", image)
            .text("location", location.wire_format());

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%scan_id, status = status.as_u16(), "analysis service rejected scan");
            return Err(SubmissionError::ServerError {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let raw = serde_json::from_str::<RawScanResponse>(&body)
            .map_err(|source| SubmissionError::MalformedResponse { source })?;
        tracing::info!(%scan_id, "analysis response received");
        Ok(raw)
    }
}
