//! # Temporal Types — UTC-Only Timestamps
//!
//! Defines `Timestamp`, the type of a manifest's `created_at_utc` field:
//! ISO-8601 in UTC with a `Z` suffix, truncated to seconds precision.
//!
//! Non-UTC inputs are **rejected at construction**. `+00:00` is rejected
//! too, so that a manifest has exactly one spelling for each instant.

use std::fmt;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Parse an RFC 3339 string with a `Z` suffix.
    ///
    /// # Errors
    ///
    /// Returns a description if the string is not RFC 3339 or does not end
    /// with `Z`.
    pub fn parse(s: &str) -> Result<Self, String> {
        if !s.ends_with('Z') {
            return Err(format!("timestamp must use Z suffix (UTC only), got: {s:?}"));
        }
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| format!("invalid RFC 3339 timestamp {s:?}: {e}"))?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// From a Unix epoch timestamp in seconds.
    ///
    /// # Errors
    ///
    /// Returns a description if `secs` is outside chrono's supported range.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, String> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| format!("invalid Unix timestamp: {secs}"))
    }

    /// Render as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

impl TryFrom<String> for Timestamp {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self {
        value.to_iso8601()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_z_suffix() {
        let ts = Timestamp::parse("2025-01-15T12:00:00Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2025-01-15T12:00:00Z");
    }

    #[test]
    fn parse_truncates_subseconds() {
        let ts = Timestamp::parse("2025-01-15T12:00:00.987Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2025-01-15T12:00:00Z");
    }

    #[test]
    fn parse_rejects_offsets() {
        assert!(Timestamp::parse("2025-01-15T12:00:00+00:00").is_err());
        assert!(Timestamp::parse("2025-01-15T12:00:00+05:30").is_err());
        assert!(Timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn from_epoch_secs_formats_utc() {
        let ts = Timestamp::from_epoch_secs(0).unwrap();
        assert_eq!(ts.to_string(), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn now_has_no_subseconds() {
        let now = Timestamp::now();
        assert_eq!(Timestamp::parse(&now.to_string()).unwrap(), now);
    }

    #[test]
    fn serde_uses_iso8601_string() {
        let ts = Timestamp::parse("2025-03-01T08:30:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2025-03-01T08:30:00Z\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
        assert!(serde_json::from_str::<Timestamp>("\"2025-03-01T08:30:00+01:00\"").is_err());
    }
}
