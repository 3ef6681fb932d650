use thiserror::Error;

/// Failures of the single-attempt scan submission.
///
/// None of these halt the flow: the normalizer absorbs every variant into a
/// degraded-but-valid result card.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The endpoint string could not be parsed at construction time.
    #[error("invalid endpoint URL \"{url}\": {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// Transport-level failure: DNS, connect, TLS, or timeout.
    #[error("analysis service unreachable: {0}")]
    NetworkUnreachable(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("analysis service returned HTTP {status}")]
    ServerError { status: u16 },

    /// The response body was not parseable JSON.
    #[error("malformed analysis response: {source}")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
    },
}
