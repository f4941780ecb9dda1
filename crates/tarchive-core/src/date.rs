//! Date partition keys.
//!
//! Every archive directory is named by a UTC calendar date. `DateKey` is the
//! only way a date string reaches path construction, so anything that is not
//! exactly `YYYY-MM-DD` (ASCII digits and two dashes) is rejected up front.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Validated `YYYY-MM-DD` partition name.
///
/// Ordering is lexicographic, which for this fixed-width format is also
/// chronological.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(String);

impl DateKey {
    /// Parse a date key, rejecting anything that does not match `YYYY-MM-DD`.
    pub fn parse(s: &str) -> Result<Self> {
        if Self::matches(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(CoreError::InvalidDate(s.to_string()))
        }
    }

    /// Check whether `s` has the shape of a date key.
    ///
    /// Shape only: `2025-13-45` passes. Directory listings use the same check,
    /// so anything this accepts is also something the writer could have created
    /// or an operator could have placed by hand.
    pub fn matches(s: &str) -> bool {
        let bytes = s.as_bytes();
        bytes.len() == 10
            && bytes.iter().enumerate().all(|(i, b)| match i {
                4 | 7 => *b == b'-',
                _ => b.is_ascii_digit(),
            })
    }

    /// Partition key for a UTC timestamp.
    pub fn from_datetime(time: &DateTime<Utc>) -> Self {
        Self(time.format("%Y-%m-%d").to_string())
    }

    /// Partition key for the current UTC date.
    pub fn today() -> Self {
        Self::from_datetime(&Utc::now())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DateKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DateKey {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        if Self::matches(&s) {
            Ok(Self(s))
        } else {
            Err(CoreError::InvalidDate(s))
        }
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.0
    }
}

impl AsRef<str> for DateKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_valid() {
        let key = DateKey::parse("2025-05-22").unwrap();
        assert_eq!(key.as_str(), "2025-05-22");
        assert_eq!(key.to_string(), "2025-05-22");
    }

    #[test]
    fn test_parse_rejects_traversal_and_bad_shapes() {
        for bad in [
            "",
            "..",
            "../etc",
            "2025-1-1",
            "2025-05-22/..",
            "2025/05/22",
            "2025-05-2a",
            " 2025-05-22",
            "2025-05-22.zip",
        ] {
            assert!(DateKey::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_from_datetime_uses_utc_date() {
        let t = Utc.with_ymd_and_hms(2025, 1, 9, 23, 59, 59).unwrap();
        assert_eq!(DateKey::from_datetime(&t).as_str(), "2025-01-09");
    }

    #[test]
    fn test_ordering_is_chronological() {
        let mut keys = vec![
            DateKey::parse("2025-01-10").unwrap(),
            DateKey::parse("2024-12-31").unwrap(),
            DateKey::parse("2025-01-09").unwrap(),
        ];
        keys.sort();
        let sorted: Vec<&str> = keys.iter().map(DateKey::as_str).collect();
        assert_eq!(sorted, vec!["2024-12-31", "2025-01-09", "2025-01-10"]);
    }

    #[test]
    fn test_serde_validates() {
        let ok: DateKey = serde_json::from_str("\"2025-05-22\"").unwrap();
        assert_eq!(ok.as_str(), "2025-05-22");
        assert!(serde_json::from_str::<DateKey>("\"../x\"").is_err());
    }
}
