//! Token observation and archive record types.
//!
//! JSON keys are camelCase with the upper-case currency suffixes used by the
//! upstream pipeline (`priceSOL`, `priceUSD`, `marketCapUSD`).

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{CoreError, Result};
use crate::lenient;
use crate::market_cap::parse_market_cap;

/// Format a timestamp the way archive files store it: RFC 3339, UTC,
/// millisecond precision, `Z` suffix.
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A token as handed over by the upstream pipeline.
///
/// Only `id` is required. Numeric fields accept numbers or numeric strings;
/// values that cannot be interpreted become `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenObservation {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub mint: Option<String>,
    /// Kept as supplied (string or epoch number).
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<Value>,
    #[serde(rename = "priceSOL", default, deserialize_with = "lenient::number")]
    pub price_sol: Option<f64>,
    #[serde(rename = "priceUSD", default, deserialize_with = "lenient::number")]
    pub price_usd: Option<f64>,
    #[serde(rename = "marketCapUSD", default, deserialize_with = "lenient::number")]
    pub market_cap_usd: Option<f64>,
    /// Display string such as `"4.7K"`, used when `marketCapUSD` is absent.
    #[serde(rename = "marketCap", default, deserialize_with = "lenient::text")]
    pub market_cap: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub volume: Option<f64>,
}

impl TokenObservation {
    /// Create an observation carrying only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Reject observations that cannot be archived.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(CoreError::InvalidToken("missing id".to_string()));
        }
        Ok(())
    }

    /// Market cap in USD: the numeric value if supplied, else parsed from the
    /// display string.
    pub fn resolved_market_cap_usd(&self) -> Option<f64> {
        self.market_cap_usd
            .or_else(|| self.market_cap.as_deref().and_then(parse_market_cap))
    }
}

/// One timestamped price/volume observation, as appended to `checkHistory`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub time: DateTime<Utc>,
    pub price_sol: Option<f64>,
    pub price_usd: Option<f64>,
    pub market_cap_usd: Option<f64>,
    pub volume: Option<f64>,
}

impl Snapshot {
    /// Capture the current field values of `token` at `time`.
    pub fn capture(token: &TokenObservation, time: DateTime<Utc>) -> Self {
        Self {
            time,
            price_sol: token.price_sol,
            price_usd: token.price_usd,
            market_cap_usd: token.resolved_market_cap_usd(),
            volume: token.volume,
        }
    }
}

impl From<&Snapshot> for Value {
    fn from(snapshot: &Snapshot) -> Self {
        json!({
            "time": format_timestamp(&snapshot.time),
            "priceSOL": snapshot.price_sol,
            "priceUSD": snapshot.price_usd,
            "marketCapUSD": snapshot.market_cap_usd,
            "volume": snapshot.volume,
        })
    }
}

/// A token's archive record for one calendar day.
///
/// Held as the JSON object it was read from, so a read-append-write cycle
/// leaves every existing key and history entry exactly as it was. Any JSON
/// object is a readable archive; accessors tolerate missing or oddly typed
/// fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenArchive(Map<String, Value>);

impl TokenArchive {
    /// Start a new archive for `token` whose first entry is `snapshot`.
    ///
    /// `createdAt` comes from the token when it supplies a truthy value,
    /// otherwise it is the snapshot time.
    pub fn first(token: &TokenObservation, snapshot: &Snapshot) -> Self {
        let created_at = token
            .created_at
            .clone()
            .filter(lenient::is_truthy)
            .unwrap_or_else(|| Value::String(format_timestamp(&snapshot.time)));

        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(token.id.clone()));
        if let Some(name) = &token.name {
            map.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(mint) = &token.mint {
            map.insert("mint".to_string(), Value::String(mint.clone()));
        }
        map.insert("createdAt".to_string(), created_at);
        map.insert("checkHistory".to_string(), Value::Array(vec![snapshot.into()]));
        Self(map)
    }

    /// Append a snapshot and return the new history length.
    ///
    /// A missing or `null` `checkHistory` starts a new list. Any other
    /// non-array value cannot be appended to and is left untouched.
    pub fn push(&mut self, snapshot: &Snapshot) -> Result<usize> {
        let history = self
            .0
            .entry("checkHistory")
            .or_insert_with(|| Value::Array(Vec::new()));
        if history.is_null() {
            *history = Value::Array(Vec::new());
        }
        match history {
            Value::Array(entries) => {
                entries.push(snapshot.into());
                Ok(entries.len())
            }
            other => Err(CoreError::InvalidArchive(format!(
                "checkHistory is not an array: {other}"
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// `name` as text; numbers are rendered, other types are `None`.
    pub fn name(&self) -> Option<String> {
        self.0.get("name").and_then(lenient::as_text)
    }

    pub fn mint(&self) -> Option<String> {
        self.0.get("mint").and_then(lenient::as_text)
    }

    pub fn created_at(&self) -> Option<String> {
        self.0.get("createdAt").and_then(lenient::as_text)
    }

    /// History entries as stored. Empty when `checkHistory` is missing or
    /// not an array.
    pub fn check_history(&self) -> &[Value] {
        self.0
            .get("checkHistory")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Most recent history entry, if any.
    pub fn latest(&self) -> Option<&Value> {
        self.check_history().last()
    }

    pub fn check_count(&self) -> usize {
        self.check_history().len()
    }
}
