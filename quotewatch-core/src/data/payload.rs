//! Raw provider payload.
//!
//! `serde_json::Value` collapses repeated object keys, which would hide
//! duplicate timestamps from the normalizer. The series objects are therefore
//! deserialized with a visitor that keeps every entry in document order.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Top-level keys starting with this prefix are series objects.
pub const SERIES_KEY_PREFIX: &str = "Time Series";

/// Keys the provider uses to explain a 2xx response without data.
pub const PROVIDER_MESSAGE_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];

/// One timestamp entry exactly as it appeared in the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub timestamp: String,
    pub fields: BTreeMap<String, Value>,
}

/// A series object with entries in document order, duplicates kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeries {
    entries: Vec<RawEntry>,
}

impl RawSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, timestamp: impl Into<String>, fields: BTreeMap<String, Value>) {
        self.entries.push(RawEntry {
            timestamp: timestamp.into(),
            fields,
        });
    }

    pub fn entries(&self) -> &[RawEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for RawSeries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SeriesVisitor;

        impl<'de> Visitor<'de> for SeriesVisitor {
            type Value = RawSeries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping timestamps to OHLCV objects")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawSeries, A::Error> {
                let mut series = RawSeries::new();
                while let Some(timestamp) = map.next_key::<String>()? {
                    let fields: BTreeMap<String, Value> = map.next_value()?;
                    series.push(timestamp, fields);
                }
                Ok(series)
            }
        }

        deserializer.deserialize_map(SeriesVisitor)
    }
}

/// Decoded response body: series objects plus everything else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPayload {
    series: BTreeMap<String, RawSeries>,
    other: BTreeMap<String, Value>,
}

impl RawPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn with_series(mut self, key: impl Into<String>, series: RawSeries) -> Self {
        self.series.insert(key.into(), series);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.other.insert(key.into(), value);
        self
    }

    /// The series stored under `key`, if present.
    pub fn series(&self, key: &str) -> Option<&RawSeries> {
        self.series.get(key)
    }

    pub fn series_keys(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Non-series top-level value, e.g. `"Meta Data"`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.other.get(key)
    }

    /// First explanatory message the provider attached, if any.
    pub fn provider_message(&self) -> Option<String> {
        PROVIDER_MESSAGE_KEYS.iter().find_map(|key| {
            self.other.get(*key).map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        })
    }
}

impl<'de> Deserialize<'de> for RawPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PayloadVisitor;

        impl<'de> Visitor<'de> for PayloadVisitor {
            type Value = RawPayload;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawPayload, A::Error> {
                let mut payload = RawPayload::new();
                while let Some(key) = map.next_key::<String>()? {
                    if key.starts_with(SERIES_KEY_PREFIX) {
                        let series: RawSeries = map.next_value()?;
                        payload.series.insert(key, series);
                    } else {
                        let value: Value = map.next_value()?;
                        payload.other.insert(key, value);
                    }
                }
                Ok(payload)
            }
        }

        deserializer.deserialize_map(PayloadVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_duplicate_timestamps_in_document_order() {
        let body = br#"{
            "Meta Data": {"2. Symbol": "MSFT"},
            "Time Series (5min)": {
                "2024-01-02 09:35:00": {"4. close": "1"},
                "2024-01-02 09:30:00": {"4. close": "2"},
                "2024-01-02 09:35:00": {"4. close": "3"}
            }
        }"#;
        let payload = RawPayload::from_slice(body).unwrap();
        let series = payload.series("Time Series (5min)").unwrap();

        let stamps: Vec<&str> = series
            .entries()
            .iter()
            .map(|e| e.timestamp.as_str())
            .collect();
        assert_eq!(
            stamps,
            vec![
                "2024-01-02 09:35:00",
                "2024-01-02 09:30:00",
                "2024-01-02 09:35:00"
            ]
        );
        assert_eq!(series.entries()[2].fields["4. close"], Value::from("3"));
        assert!(payload.field("Meta Data").is_some());
    }

    #[test]
    fn surfaces_provider_message() {
        let body = br#"{"Error Message": "Invalid API call."}"#;
        let payload = RawPayload::from_slice(body).unwrap();
        assert_eq!(payload.provider_message().as_deref(), Some("Invalid API call."));
        assert_eq!(payload.series_keys().count(), 0);
    }

    #[test]
    fn rejects_non_object_body() {
        assert!(RawPayload::from_slice(b"[1, 2, 3]").is_err());
        assert!(RawPayload::from_slice(b"<html>").is_err());
    }

    #[test]
    fn rejects_non_object_series() {
        let body = br#"{"Time Series (5min)": "nope"}"#;
        assert!(RawPayload::from_slice(body).is_err());
    }
}
