//! Submission of captured frames to the remote pricing service, and
//! normalization of its loosely-typed responses into [`fairlo_core::ScanResult`].

pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

pub use client::ScanSubmissionClient;
pub use error::SubmissionError;
pub use normalize::{normalize_outcome, normalize_response, submission_failure_result};
pub use types::RawScanResponse;
