//! Raw response shape from the pricing service.
//!
//! ## Observed contract
//!
//! The service returns a JSON object whose keys are only loosely stable:
//! several concepts are spelled with one of two competing names depending on
//! backend version. Observed alias groups:
//!
//! - item name: `item_name` / `detected_item`
//! - emoji: `emoji` / `item_emoji`
//! - local price estimate: `local_price` / `local_price_estimate`
//! - asking price: `detected_price` / `asking_price`
//! - currency symbol: `currency` / `currency_symbol`
//! - local range: `local_range` / `price_range`
//! - insight line: `insight` / `cultural_insight`
//! - region: `region` / `location_name`
//!
//! Numeric fields may arrive as JSON numbers or as strings with a currency
//! prefix (`"₹150"`). The payload is treated as untrusted input throughout;
//! resolution order and defaults live in [`crate::normalize`].

use serde::Deserialize;
use serde_json::Value;

/// An untyped, partially-unknown response from the pricing service.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct RawScanResponse(pub Value);

impl RawScanResponse {
    /// The first non-null value among `keys`, in priority order.
    ///
    /// Returns `None` when the payload is not an object or carries none of
    /// the keys.
    #[must_use]
    pub fn field(&self, keys: [&str; 2]) -> Option<&Value> {
        keys.iter()
            .filter_map(|key| self.0.get(key))
            .find(|value| !value.is_null())
    }
}
