//! Best-effort location resolution.
//!
//! One single-shot query per session with a fixed timeout and cache window.
//! Resolution never fails: every error path lands on the fallback
//! coordinate with status `denied`, so the pipeline always has a coordinate
//! to submit.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use fairlo_core::{Coordinate, LocationStatus, FALLBACK_COORDINATE};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The host has no geolocation capability at all.
    #[error("geolocation not supported on this host")]
    Unsupported,

    #[error("geolocation permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    Unavailable,
}

/// Platform geolocation seam.
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// A single-shot coordinate query. `max_age` is the window within which
    /// a cached fix may be returned instead of a fresh one.
    async fn current_position(&self, max_age: Duration) -> Result<Coordinate, LocationError>;
}

/// A host with a fixed, known coordinate (e.g. configured via environment).
pub struct StaticLocationSource {
    coordinate: Coordinate,
}

impl StaticLocationSource {
    #[must_use]
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl LocationSource for StaticLocationSource {
    async fn current_position(&self, _max_age: Duration) -> Result<Coordinate, LocationError> {
        Ok(self.coordinate)
    }
}

/// A host with no geolocation capability.
pub struct UnsupportedLocationSource;

#[async_trait]
impl LocationSource for UnsupportedLocationSource {
    async fn current_position(&self, _max_age: Duration) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// The session's resolved coordinate and how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLocation {
    pub coordinate: Coordinate,
    pub status: LocationStatus,
}

impl ResolvedLocation {
    /// Pre-resolution placeholder: the fallback coordinate, still loading.
    #[must_use]
    pub fn loading() -> Self {
        Self {
            coordinate: FALLBACK_COORDINATE,
            status: LocationStatus::Loading,
        }
    }
}

/// Resolves the session coordinate with a fixed timeout and cache window.
pub struct LocationProvider {
    source: Arc<dyn LocationSource>,
    timeout: Duration,
    max_age: Duration,
}

impl LocationProvider {
    #[must_use]
    pub fn new(source: Arc<dyn LocationSource>, timeout: Duration, max_age: Duration) -> Self {
        Self {
            source,
            timeout,
            max_age,
        }
    }

    /// Runs the query. Infallible by contract: denial, unavailability, and
    /// timeout all settle on the fallback coordinate with status `denied`.
    pub async fn resolve(&self) -> ResolvedLocation {
        match tokio::time::timeout(self.timeout, self.source.current_position(self.max_age)).await
        {
            Ok(Ok(coordinate)) => {
                tracing::info!(lat = coordinate.lat, lng = coordinate.lng, "location obtained");
                ResolvedLocation {
                    coordinate,
                    status: LocationStatus::Granted,
                }
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "geolocation failed; using fallback location");
                ResolvedLocation {
                    coordinate: FALLBACK_COORDINATE,
                    status: LocationStatus::Denied,
                }
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    "geolocation timed out; using fallback location"
                );
                ResolvedLocation {
                    coordinate: FALLBACK_COORDINATE,
                    status: LocationStatus::Denied,
                }
            }
        }
    }
}
