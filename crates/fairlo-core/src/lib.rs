//! Shared domain types and configuration for the Fairlo price scanner.
//!
//! Holds the data model that crosses crate boundaries (coordinates, flow and
//! camera status enums, captured frames, the normalized [`ScanResult`]) and
//! the environment-driven application configuration.

pub mod app_config;
pub mod config;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use types::{
    CameraStatus, CapturedFrame, Coordinate, DealRating, FlowState, LocationStatus, ScanResult,
    FALLBACK_COORDINATE, FRAME_MIME,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
