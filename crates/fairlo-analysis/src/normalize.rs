//! Normalization of raw analysis responses into [`ScanResult`].
//!
//! Field resolution is a fixed, documented policy: the primary key first,
//! the documented alternate second, a fixed default last (see the table in
//! [`crate::types`]). Numeric fields are coerced leniently — a string like
//! `"₹150"` resolves to `150` — and never abort normalization; unresolvable
//! prices fall back to the placeholder pair so the pipeline always
//! terminates in a displayable result. `overprice_percentage` is always
//! recomputed from the resolved prices, never trusted from the payload.

use fairlo_core::ScanResult;
use serde_json::Value;

use crate::error::SubmissionError;
use crate::types::RawScanResponse;

const NAME_KEYS: [&str; 2] = ["item_name", "detected_item"];
const EMOJI_KEYS: [&str; 2] = ["emoji", "item_emoji"];
const LOCAL_PRICE_KEYS: [&str; 2] = ["local_price", "local_price_estimate"];
const DETECTED_PRICE_KEYS: [&str; 2] = ["detected_price", "asking_price"];
const CURRENCY_KEYS: [&str; 2] = ["currency", "currency_symbol"];
const RANGE_KEYS: [&str; 2] = ["local_range", "price_range"];
const INSIGHT_KEYS: [&str; 2] = ["insight", "cultural_insight"];
const REGION_KEYS: [&str; 2] = ["region", "location_name"];

/// Placeholder local price used when both price aliases are absent or
/// unparseable.
pub const DEFAULT_LOCAL_PRICE: f64 = 80.0;

/// Markup applied to the local price when the service omits the asking
/// price. With the placeholder local price this yields the documented
/// default pair (80, 104).
const DETECTED_MARKUP: f64 = 1.3;

const DEFAULT_NAME: &str = "Unknown Item";
const DEFAULT_EMOJI: &str = "🏷️";
const DEFAULT_CURRENCY: &str = "₹";
const DEFAULT_INSIGHT: &str = "Local market analysis";
const DEFAULT_REGION: &str = "Jaipur";

const FAILURE_NAME: &str = "Analysis Failed";
const FAILURE_EMOJI: &str = "🤔";
const FAILURE_REGION: &str = "Unknown";

/// Maps a submission outcome into the stable result model.
#[must_use]
pub fn normalize_outcome(outcome: Result<RawScanResponse, SubmissionError>) -> ScanResult {
    match outcome {
        Ok(raw) => normalize_response(&raw),
        Err(err) => submission_failure_result(&err),
    }
}

/// Converts a raw service response into a [`ScanResult`], filling defaults
/// and deriving presentation fields.
#[must_use]
pub fn normalize_response(raw: &RawScanResponse) -> ScanResult {
    let name = resolve_string(raw, NAME_KEYS, DEFAULT_NAME);
    let emoji = resolve_string(raw, EMOJI_KEYS, DEFAULT_EMOJI);
    let currency = resolve_string(raw, CURRENCY_KEYS, DEFAULT_CURRENCY);
    let insight = resolve_string(raw, INSIGHT_KEYS, DEFAULT_INSIGHT);
    let region = resolve_string(raw, REGION_KEYS, DEFAULT_REGION);

    let local_price = resolve_price(raw, LOCAL_PRICE_KEYS).unwrap_or(DEFAULT_LOCAL_PRICE);
    let detected_price = resolve_price(raw, DETECTED_PRICE_KEYS)
        .unwrap_or_else(|| (local_price * DETECTED_MARKUP).round());

    let local_range = resolve_string_opt(raw, RANGE_KEYS)
        .unwrap_or_else(|| derived_range(&currency, local_price));

    ScanResult {
        name,
        emoji,
        detected_price,
        local_price,
        currency,
        local_range,
        overprice_percentage: overprice_percentage(detected_price, local_price),
        insight,
        region,
    }
}

/// The degraded-but-valid card shown when the submission itself failed.
#[must_use]
pub fn submission_failure_result(err: &SubmissionError) -> ScanResult {
    let insight = match err {
        SubmissionError::NetworkUnreachable(_) => {
            "We couldn't reach the analysis service. Check your connection and try again."
        }
        SubmissionError::ServerError { .. } => {
            "The analysis service had trouble with this scan. Try again in a moment."
        }
        SubmissionError::MalformedResponse { .. } => {
            "The analysis service sent back something we couldn't read."
        }
        SubmissionError::InvalidEndpoint { .. } => "The analysis service is misconfigured.",
    };
    tracing::warn!(error = %err, "submission failed; producing fallback card");
    failure_result(insight)
}

/// A zero-priced card with an explanatory insight. Used for submission
/// failures and for capture failures upstream of submission.
#[must_use]
pub fn failure_result(insight: &str) -> ScanResult {
    ScanResult {
        name: FAILURE_NAME.to_owned(),
        emoji: FAILURE_EMOJI.to_owned(),
        detected_price: 0.0,
        local_price: 0.0,
        currency: DEFAULT_CURRENCY.to_owned(),
        local_range: "—".to_owned(),
        overprice_percentage: 0,
        insight: insight.to_owned(),
        region: FAILURE_REGION.to_owned(),
    }
}

/// Recomputes the over-price percentage from the resolved prices.
///
/// `round(((detected - local) / local) * 100)` when `local > 0`, else `0`.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
fn overprice_percentage(detected: f64, local: f64) -> i32 {
    if local > 0.0 {
        (((detected - local) / local) * 100.0).round() as i32
    } else {
        0
    }
}

fn resolve_string(raw: &RawScanResponse, keys: [&str; 2], default: &str) -> String {
    resolve_string_opt(raw, keys).unwrap_or_else(|| default.to_owned())
}

fn resolve_string_opt(raw: &RawScanResponse, keys: [&str; 2]) -> Option<String> {
    match raw.field(keys)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        // Occasionally the service sends numbers where strings belong
        // (e.g. a bare range bound); render them rather than discarding.
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn resolve_price(raw: &RawScanResponse, keys: [&str; 2]) -> Option<f64> {
    raw.field(keys).and_then(coerce_number)
}

/// Lenient numeric coercion: JSON numbers pass through, strings are scanned
/// for their first embedded decimal number (`"₹150"`, `"about 40 rupees"`).
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => extract_number(s),
        _ => None,
    }
}

/// Scans `s` for the first run of ASCII digits with at most one embedded
/// decimal point and parses it as `f64`.
fn extract_number(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    let mut end = start;
    let mut has_dot = false;
    while end < bytes.len() {
        let b = bytes[end];
        if b.is_ascii_digit() {
            end += 1;
        } else if b == b'.' && !has_dot && end + 1 < bytes.len() && bytes[end + 1].is_ascii_digit()
        {
            has_dot = true;
            end += 1;
        } else {
            break;
        }
    }
    s[start..end].parse::<f64>().ok()
}

/// Range derived from the local price when the service sends none:
/// `{currency}{round(local×0.8)}–{currency}{round(local×1.2)}`.
fn derived_range(currency: &str, local_price: f64) -> String {
    let low = (local_price * 0.8).round();
    let high = (local_price * 1.2).round();
    format!("{currency}{low:.0}–{currency}{high:.0}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(value: serde_json::Value) -> RawScanResponse {
        RawScanResponse(value)
    }

    // -----------------------------------------------------------------------
    // field resolution
    // -----------------------------------------------------------------------

    #[test]
    fn primary_keys_win_over_alternates() {
        let result = normalize_response(&raw(serde_json::json!({
            "item_name": "Clay Cup",
            "detected_item": "Something Else",
            "local_price": 20,
            "local_price_estimate": 999,
        })));
        assert_eq!(result.name, "Clay Cup");
        assert!((result.local_price - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn alternates_fill_in_for_missing_primaries() {
        let result = normalize_response(&raw(serde_json::json!({
            "detected_item": "Wooden Elephant",
            "local_price_estimate": "₹150",
        })));
        assert_eq!(result.name, "Wooden Elephant");
        assert!((result.local_price - 150.0).abs() < f64::EPSILON);
        // Detected price derives from the local estimate.
        assert!((result.detected_price - 195.0).abs() < f64::EPSILON);
        assert_eq!(result.overprice_percentage, 30);
    }

    #[test]
    fn missing_price_aliases_yield_default_pair() {
        let result = normalize_response(&raw(serde_json::json!({
            "item_name": "Mystery Object",
        })));
        assert!((result.local_price - 80.0).abs() < f64::EPSILON);
        assert!((result.detected_price - 104.0).abs() < f64::EPSILON);
        assert_eq!(result.overprice_percentage, 30);
    }

    #[test]
    fn unparseable_prices_fall_back_to_default_pair() {
        let result = normalize_response(&raw(serde_json::json!({
            "local_price": "cheap",
            "detected_price": {"amount": 10},
        })));
        assert!((result.local_price - 80.0).abs() < f64::EPSILON);
        assert!((result.detected_price - 104.0).abs() < f64::EPSILON);
    }

    #[test]
    fn all_defaults_on_empty_object() {
        let result = normalize_response(&raw(serde_json::json!({})));
        assert_eq!(result.name, "Unknown Item");
        assert_eq!(result.emoji, "🏷️");
        assert_eq!(result.currency, "₹");
        assert_eq!(result.insight, "Local market analysis");
        assert_eq!(result.region, "Jaipur");
        assert_eq!(result.local_range, "₹64–₹96");
    }

    #[test]
    fn non_object_payload_normalizes_to_defaults() {
        let result = normalize_response(&raw(serde_json::json!("unexpected")));
        assert_eq!(result.name, "Unknown Item");
        assert!((result.local_price - 80.0).abs() < f64::EPSILON);
    }

    // -----------------------------------------------------------------------
    // numeric coercion
    // -----------------------------------------------------------------------

    #[test]
    fn string_prices_with_currency_prefix_parse() {
        let result = normalize_response(&raw(serde_json::json!({
            "local_price": "₹35",
            "detected_price": "₹40",
        })));
        assert!((result.local_price - 35.0).abs() < f64::EPSILON);
        assert!((result.detected_price - 40.0).abs() < f64::EPSILON);
        assert_eq!(result.overprice_percentage, 14);
    }

    #[test]
    fn extract_number_handles_decimals_and_noise() {
        assert_eq!(extract_number("about 12.5 rupees"), Some(12.5));
        assert_eq!(extract_number("₹150"), Some(150.0));
        assert_eq!(extract_number("1.2.3"), Some(1.2));
        assert_eq!(extract_number("150."), Some(150.0));
        assert_eq!(extract_number("no digits"), None);
        assert_eq!(extract_number(""), None);
    }

    // -----------------------------------------------------------------------
    // overprice invariant
    // -----------------------------------------------------------------------

    #[test]
    fn overprice_recomputed_even_when_payload_claims_otherwise() {
        let result = normalize_response(&raw(serde_json::json!({
            "local_price": 160,
            "detected_price": 180,
            "overprice_percentage": 9000,
        })));
        assert_eq!(result.overprice_percentage, 13);
    }

    #[test]
    fn overprice_is_zero_when_local_price_is_zero() {
        let result = normalize_response(&raw(serde_json::json!({
            "local_price": 0,
            "detected_price": 50,
        })));
        assert_eq!(result.overprice_percentage, 0);
    }

    #[test]
    fn overprice_can_be_negative() {
        let result = normalize_response(&raw(serde_json::json!({
            "local_price": 100,
            "detected_price": 80,
        })));
        assert_eq!(result.overprice_percentage, -20);
    }

    #[test]
    fn overprice_rounds_to_nearest_integer() {
        assert_eq!(overprice_percentage(113.0, 100.0), 13);
        assert_eq!(overprice_percentage(180.0, 160.0), 13); // 12.5 rounds half up
        assert_eq!(overprice_percentage(300.0, 150.0), 100);
    }

    // -----------------------------------------------------------------------
    // failure cards
    // -----------------------------------------------------------------------

    #[test]
    fn server_error_produces_failure_card() {
        let err = SubmissionError::ServerError { status: 503 };
        let result = submission_failure_result(&err);
        assert_eq!(result.name, "Analysis Failed");
        assert!((result.detected_price - 0.0).abs() < f64::EPSILON);
        assert!((result.local_price - 0.0).abs() < f64::EPSILON);
        assert_eq!(result.overprice_percentage, 0);
        assert!(result.insight.contains("Try again"));
    }

    #[test]
    fn malformed_response_produces_failure_card() {
        let source = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = SubmissionError::MalformedResponse { source };
        let result = submission_failure_result(&err);
        assert_eq!(result.name, "Analysis Failed");
        assert!(result.insight.contains("couldn't read"));
    }

    #[test]
    fn normalize_outcome_passes_successes_through() {
        let outcome = Ok(raw(serde_json::json!({
            "item_name": "Fresh Coconut Water",
            "local_price": 35,
            "detected_price": 40,
            "region": "Goa",
        })));
        let result = normalize_outcome(outcome);
        assert_eq!(result.name, "Fresh Coconut Water");
        assert_eq!(result.region, "Goa");
    }

    // -----------------------------------------------------------------------
    // derived presentation fields
    // -----------------------------------------------------------------------

    #[test]
    fn explicit_range_is_preserved() {
        let result = normalize_response(&raw(serde_json::json!({
            "local_price": 160,
            "price_range": "₹140–₹180",
        })));
        assert_eq!(result.local_range, "₹140–₹180");
    }

    #[test]
    fn derived_range_brackets_the_local_price() {
        let result = normalize_response(&raw(serde_json::json!({
            "local_price": 150,
        })));
        assert_eq!(result.local_range, "₹120–₹180");
    }
}
