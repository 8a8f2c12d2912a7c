use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::CuckooError;

/// `status` reported by Cuckoo when a query ran successfully.
pub const STATUS_SUCCESS: &str = "Success";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub status: String,

    /// Entries are held undecoded so a single malformed entry does not spoil the whole response.
    #[serde(default)]
    pub timeseries: Vec<serde_json::Value>,
}

impl QueryResponse {
    pub fn from_json(body: serde_json::Value) -> Result<Self, CuckooError> {
        serde_json::from_value(body).map_err(|err| err.into())
    }
}

/// One (source descriptor, data points) pair of a query response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesEntry {
    pub source: SourceDescriptor,
    #[serde(default)]
    pub data: Vec<DataPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<String>,
}

impl SourceDescriptor {
    pub fn primary_source(&self) -> Option<&str> {
        self.sources.first().map(|s| s.as_str())
    }

    pub fn primary_metric(&self) -> Option<&str> {
        self.metrics.first().map(|m| m.as_str())
    }
}

/// `[epoch_seconds, value]`. Cuckoo may report the timestamp as an integer or a float; fractional
/// seconds are floored.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint(#[serde(deserialize_with = "deserialize_epoch_secs")] pub i64, pub f64);

fn deserialize_epoch_secs<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?.floor();
    if secs.is_finite() && (i64::MIN as f64) <= secs && secs < (i64::MAX as f64) {
        Ok(secs as i64)
    } else {
        Err(serde::de::Error::custom(format!("epoch seconds out of range: {secs}")))
    }
}

impl DataPoint {
    pub fn timestamp(&self) -> Result<DateTime<Utc>, CuckooError> {
        Utc.timestamp_opt(self.0, 0).single().ok_or_else(|| CuckooError::MalformedMetricPath {
            path: self.0.to_string(),
            reason: "data point timestamp is out of range".to_string(),
        })
    }

    pub const fn value(&self) -> f64 {
        self.1
    }
}
