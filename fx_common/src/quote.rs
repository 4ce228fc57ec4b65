//! Quote record shared by the parser engine, the sinks and the history store.
//!
//! Field order is stable and matches the persisted column order:
//! `channel, message_id, version, published, edited, currency_a, currency_b,
//! buy, sell, comment`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;

/// Timestamp layout used by the raw message log and by persisted quotes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One buy/sell price pair for an ordered currency pair at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Channel name the quote was extracted from.
    pub channel: String,
    /// Message identifier inside the channel.
    pub message_id: u64,
    /// Message version label (e.g. `v2` after an edit).
    pub version: String,
    /// Time the message was first published.
    #[serde(with = "timestamp")]
    pub published: NaiveDateTime,
    /// Time of the last edit; equals `published` for unedited messages.
    #[serde(with = "timestamp")]
    pub edited: NaiveDateTime,
    /// Base currency.
    pub currency_a: Currency,
    /// Quote currency (local currency, or the anchor for cross-rates).
    pub currency_b: Currency,
    /// Price at which the channel buys `currency_a`.
    pub buy: f64,
    /// Price at which the channel sells `currency_a`.
    pub sell: f64,
    /// Free text attached to the quote, or the cross-rate marker.
    pub comment: String,
}

impl Quote {
    /// Encode the quote as a single JSON line.
    pub fn to_json_line(&self) -> Result<String, crate::ParserError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Numeric part of a version label (`v3` -> 3); labels without one rank 0.
pub fn version_rank(version: &str) -> u64 {
    version
        .trim()
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .parse()
        .unwrap_or(0)
}

/// Serde adapter for `YYYY-MM-DD HH:MM:SS` timestamps.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    /// Serialize with [`TIMESTAMP_FORMAT`].
    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    /// Deserialize from [`TIMESTAMP_FORMAT`].
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Quote {
        let at = NaiveDateTime::parse_from_str("2025-10-14 09:30:00", TIMESTAMP_FORMAT).unwrap();
        Quote {
            channel: "GARANT".to_string(),
            message_id: 10,
            version: "v1".to_string(),
            published: at,
            edited: at,
            currency_a: Currency::USD,
            currency_b: Currency::UAH,
            buy: 41.5,
            sell: 41.8,
            comment: String::new(),
        }
    }

    #[test]
    fn test_json_line_keeps_field_order() {
        let line = sample().to_json_line().unwrap();
        assert_eq!(
            line,
            r#"{"channel":"GARANT","message_id":10,"version":"v1","published":"2025-10-14 09:30:00","edited":"2025-10-14 09:30:00","currency_a":"USD","currency_b":"UAH","buy":41.5,"sell":41.8,"comment":""}"#
        );
    }

    #[test]
    fn test_version_rank_is_numeric() {
        assert_eq!(version_rank("v2"), 2);
        assert_eq!(version_rank("v10"), 10);
        assert!(version_rank("v10") > version_rank("v9"));
        assert_eq!(version_rank("draft"), 0);
    }

    #[test]
    fn test_rejects_malformed_timestamp() {
        let line = r#"{"channel":"GARANT","message_id":10,"version":"v1","published":"14.10.2025","edited":"2025-10-14 09:30:00","currency_a":"USD","currency_b":"UAH","buy":41.5,"sell":41.8,"comment":""}"#;
        assert!(serde_json::from_str::<Quote>(line).is_err());
    }
}
