use crate::types::Coordinate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub env: Environment,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub camera_ready_fallback_ms: u64,
    pub auto_capture_delay_ms: u64,
    pub zoom_duration_ms: u64,
    pub geo_timeout_ms: u64,
    pub geo_max_age_secs: u64,
    /// Static device coordinate, when the host has no live geolocation.
    /// Absent means the geolocation query reports denied and the session
    /// runs on the fallback coordinate.
    pub device_coordinate: Option<Coordinate>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The API URL may embed a vendor token in its query string.
        f.debug_struct("AppConfig")
            .field("api_url", &"[redacted]")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("camera_ready_fallback_ms", &self.camera_ready_fallback_ms)
            .field("auto_capture_delay_ms", &self.auto_capture_delay_ms)
            .field("zoom_duration_ms", &self.zoom_duration_ms)
            .field("geo_timeout_ms", &self.geo_timeout_ms)
            .field("geo_max_age_secs", &self.geo_max_age_secs)
            .field("device_coordinate", &self.device_coordinate)
            .finish()
    }
}
