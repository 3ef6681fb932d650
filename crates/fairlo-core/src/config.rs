use crate::app_config::{AppConfig, Environment};
use crate::types::Coordinate;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_f64 = |var: &str| -> Result<Option<f64>, ConfigError> {
        match lookup(var) {
            Err(_) => Ok(None),
            Ok(raw) => raw
                .parse::<f64>()
                .map(Some)
                .map_err(|e| ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    reason: e.to_string(),
                }),
        }
    };

    let api_url = require("FAIRLO_API_URL")?;

    let env = parse_environment(&or_default("FAIRLO_ENV", "development"));
    let log_level = or_default("FAIRLO_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("FAIRLO_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("FAIRLO_USER_AGENT", "fairlo/0.1 (price-scanner)");

    let camera_ready_fallback_ms = parse_u64("FAIRLO_CAMERA_READY_FALLBACK_MS", "5000")?;
    let auto_capture_delay_ms = parse_u64("FAIRLO_AUTO_CAPTURE_DELAY_MS", "2000")?;
    let zoom_duration_ms = parse_u64("FAIRLO_ZOOM_DURATION_MS", "1200")?;

    let geo_timeout_ms = parse_u64("FAIRLO_GEO_TIMEOUT_MS", "10000")?;
    let geo_max_age_secs = parse_u64("FAIRLO_GEO_MAX_AGE_SECS", "300")?;

    // A static coordinate needs both halves; one without the other is a
    // configuration mistake, not a denied-location signal.
    let lat = parse_f64("FAIRLO_LAT")?;
    let lng = parse_f64("FAIRLO_LNG")?;
    let device_coordinate = match (lat, lng) {
        (Some(lat), Some(lng)) => Some(Coordinate { lat, lng }),
        (None, None) => None,
        (Some(_), None) => {
            return Err(ConfigError::InvalidEnvVar {
                var: "FAIRLO_LNG".to_string(),
                reason: "FAIRLO_LAT is set but FAIRLO_LNG is missing".to_string(),
            })
        }
        (None, Some(_)) => {
            return Err(ConfigError::InvalidEnvVar {
                var: "FAIRLO_LAT".to_string(),
                reason: "FAIRLO_LNG is set but FAIRLO_LAT is missing".to_string(),
            })
        }
    };

    Ok(AppConfig {
        api_url,
        env,
        log_level,
        request_timeout_secs,
        user_agent,
        camera_ready_fallback_ms,
        auto_capture_delay_ms,
        zoom_duration_ms,
        geo_timeout_ms,
        geo_max_age_secs,
        device_coordinate,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
