//! Time-series normalizer: raw payload in, sorted typed series out.

use super::payload::{RawEntry, RawPayload};
use crate::domain::{Interval, PricePoint, SeriesError, Symbol, TimeSeries};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Provider field names mapped to canonical columns. Anything else is dropped.
const FIELD_MAP: [(&str, Field); 5] = [
    ("1. open", Field::Open),
    ("2. high", Field::High),
    ("3. low", Field::Low),
    ("4. close", Field::Close),
    ("5. volume", Field::Volume),
];

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Open => "open",
            Field::High => "high",
            Field::Low => "low",
            Field::Close => "close",
            Field::Volume => "volume",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed timestamp '{raw}'")]
    Timestamp { raw: String },

    #[error("entry {timestamp} is missing field '{}'", .field.name())]
    MissingField { timestamp: String, field: Field },

    #[error("entry {timestamp} has non-numeric {} value {raw}", .field.name())]
    InvalidNumber {
        timestamp: String,
        field: Field,
        raw: String,
    },

    #[error("duplicate timestamp {timestamp}")]
    DuplicateTimestamp { timestamp: NaiveDateTime },

    #[error(transparent)]
    Series(#[from] SeriesError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The payload lacks the series key: bad symbol, bad key, or throttled.
    #[error(
        "could not retrieve data for symbol '{symbol}': response has no '{expected_key}' key{}",
        .provider_message.as_deref().map(|m| format!(" (provider said: {m})")).unwrap_or_default()
    )]
    Schema {
        symbol: String,
        expected_key: String,
        provider_message: Option<String>,
    },

    #[error("could not parse data for symbol '{symbol}': {source}")]
    Parse {
        symbol: String,
        #[source]
        source: ParseError,
    },
}

/// What to do when two entries resolve to the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    #[default]
    KeepLast,
    KeepFirst,
    Reject,
}

/// Turns a provider payload into a `TimeSeries`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    interval: Interval,
    duplicate_policy: DuplicatePolicy,
}

impl Normalizer {
    pub fn new(interval: Interval, duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            interval,
            duplicate_policy,
        }
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Normalize a payload: locate the series, parse, resolve duplicates, sort.
    ///
    /// Same payload in, same series out.
    pub fn normalize(
        &self,
        symbol: &Symbol,
        payload: &RawPayload,
    ) -> Result<TimeSeries, NormalizeError> {
        let expected_key = self.interval.series_key();
        let raw = payload
            .series(&expected_key)
            .ok_or_else(|| NormalizeError::Schema {
                symbol: symbol.to_string(),
                expected_key: expected_key.clone(),
                provider_message: payload.provider_message(),
            })?;

        let parse_err = |source: ParseError| NormalizeError::Parse {
            symbol: symbol.to_string(),
            source,
        };

        let mut by_time: BTreeMap<NaiveDateTime, PricePoint> = BTreeMap::new();
        let mut duplicates = 0usize;

        for entry in raw.entries() {
            let point = parse_entry(entry).map_err(parse_err)?;
            match by_time.entry(point.timestamp) {
                Entry::Vacant(slot) => {
                    slot.insert(point);
                }
                Entry::Occupied(mut slot) => {
                    duplicates += 1;
                    warn!(
                        symbol = %symbol,
                        timestamp = %point.timestamp,
                        policy = ?self.duplicate_policy,
                        "duplicate timestamp in payload"
                    );
                    match self.duplicate_policy {
                        DuplicatePolicy::KeepLast => {
                            slot.insert(point);
                        }
                        DuplicatePolicy::KeepFirst => {}
                        DuplicatePolicy::Reject => {
                            return Err(parse_err(ParseError::DuplicateTimestamp {
                                timestamp: point.timestamp,
                            }));
                        }
                    }
                }
            }
        }

        let points: Vec<PricePoint> = by_time.into_values().collect();
        debug!(
            symbol = %symbol,
            entries = raw.len(),
            points = points.len(),
            duplicates,
            "normalized payload"
        );

        TimeSeries::new(symbol.clone(), self.interval, points)
            .map_err(|e| parse_err(ParseError::Series(e)))
    }

    /// Scan for suspicious points. Reports only; the series is left untouched.
    pub fn detect_anomalies(&self, series: &TimeSeries) -> Vec<AnomalyReport> {
        let mut anomalies = Vec::new();

        let zero_volume = series.points().iter().filter(|p| p.volume == 0).count();
        if zero_volume > 0 {
            anomalies.push(AnomalyReport {
                anomaly_type: AnomalyType::ZeroVolume,
                count: zero_volume,
                severity: Severity::Info,
            });
        }

        let insane = series.points().iter().filter(|p| !p.is_sane()).count();
        if insane > 0 {
            anomalies.push(AnomalyReport {
                anomaly_type: AnomalyType::InsaneRange,
                count: insane,
                severity: Severity::Warning,
            });
        }

        // Gaps within one trading day; overnight gaps are expected.
        let step = chrono::Duration::minutes(self.interval.minutes());
        let gaps = series
            .points()
            .windows(2)
            .filter(|w| {
                w[0].timestamp.date() == w[1].timestamp.date()
                    && w[1].timestamp - w[0].timestamp > step
            })
            .count();
        if gaps > 0 {
            anomalies.push(AnomalyReport {
                anomaly_type: AnomalyType::SessionGap,
                count: gaps,
                severity: Severity::Info,
            });
        }

        anomalies
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnomalyReport {
    pub anomaly_type: AnomalyType,
    pub count: usize,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnomalyType {
    ZeroVolume,
    InsaneRange,
    SessionGap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Info,
    Warning,
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, ParseError> {
    let trimmed = raw.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ParseError::Timestamp {
            raw: raw.to_string(),
        })
}

fn parse_entry(entry: &RawEntry) -> Result<PricePoint, ParseError> {
    let timestamp = parse_timestamp(&entry.timestamp)?;

    let mut open = None;
    let mut high = None;
    let mut low = None;
    let mut close = None;
    let mut volume = None;

    for (name, field) in FIELD_MAP {
        let Some(value) = entry.fields.get(name) else {
            continue;
        };
        match field {
            Field::Volume => volume = Some(parse_volume(entry, value)?),
            Field::Open => open = Some(parse_price(entry, field, value)?),
            Field::High => high = Some(parse_price(entry, field, value)?),
            Field::Low => low = Some(parse_price(entry, field, value)?),
            Field::Close => close = Some(parse_price(entry, field, value)?),
        }
    }

    let require = |v: Option<f64>, field: Field| {
        v.ok_or_else(|| ParseError::MissingField {
            timestamp: entry.timestamp.clone(),
            field,
        })
    };

    Ok(PricePoint {
        timestamp,
        open: require(open, Field::Open)?,
        high: require(high, Field::High)?,
        low: require(low, Field::Low)?,
        close: require(close, Field::Close)?,
        volume: volume.ok_or_else(|| ParseError::MissingField {
            timestamp: entry.timestamp.clone(),
            field: Field::Volume,
        })?,
    })
}

fn invalid(entry: &RawEntry, field: Field, value: &Value) -> ParseError {
    ParseError::InvalidNumber {
        timestamp: entry.timestamp.clone(),
        field,
        raw: value.to_string(),
    }
}

fn parse_price(entry: &RawEntry, field: Field, value: &Value) -> Result<f64, ParseError> {
    let parsed = match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(entry, field, value))
}

fn parse_volume(entry: &RawEntry, value: &Value) -> Result<u64, ParseError> {
    let parsed = match value {
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| integral(s.parse::<f64>().ok()))
        }
        Value::Number(n) => n.as_u64().or_else(|| integral(n.as_f64())),
        _ => None,
    };
    parsed.ok_or_else(|| invalid(entry, Field::Volume, value))
}

/// Accept "1200.0"-style volumes; reject fractions, negatives, and overflow.
fn integral(v: Option<f64>) -> Option<u64> {
    v.filter(|x| x.is_finite() && *x >= 0.0 && x.fract() == 0.0 && *x <= u64::MAX as f64)
        .map(|x| x as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::payload::RawSeries;

    fn fields(open: &str, high: &str, low: &str, close: &str, volume: &str) -> BTreeMap<String, Value> {
        [
            ("1. open", open),
            ("2. high", high),
            ("3. low", low),
            ("4. close", close),
            ("5. volume", volume),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::from(v)))
        .collect()
    }

    fn payload(entries: &[(&str, BTreeMap<String, Value>)]) -> RawPayload {
        let mut series = RawSeries::new();
        for (ts, f) in entries {
            series.push(*ts, f.clone());
        }
        RawPayload::new().with_series("Time Series (5min)", series)
    }

    fn msft() -> Symbol {
        Symbol::new("MSFT").unwrap()
    }

    #[test]
    fn sorts_ascending_and_renames_columns() {
        let p = payload(&[
            ("2024-01-02 09:40:00", fields("3", "4", "2", "3.5", "300")),
            ("2024-01-02 09:30:00", fields("1", "2", "0.5", "1.5", "100")),
            ("2024-01-02 09:35:00", fields("2", "3", "1", "2.5", "200")),
        ]);
        let series = Normalizer::default().normalize(&msft(), &p).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![1.5, 2.5, 3.5]);
        let first = series.first().unwrap();
        assert_eq!(first.open, 1.0);
        assert_eq!(first.high, 2.0);
        assert_eq!(first.low, 0.5);
        assert_eq!(first.volume, 100);
    }

    #[test]
    fn unknown_fields_are_dropped() {
        let mut f = fields("1", "2", "0.5", "1.5", "100");
        f.insert("6. dividend".into(), Value::from("oops"));
        let p = payload(&[("2024-01-02 09:30:00", f)]);
        assert_eq!(Normalizer::default().normalize(&msft(), &p).unwrap().len(), 1);
    }

    #[test]
    fn missing_series_key_is_schema_error() {
        let p = RawPayload::new().with_field(
            "Information",
            Value::from("The **demo** API key is for demo purposes only."),
        );
        let err = Normalizer::default().normalize(&msft(), &p).unwrap_err();
        match &err {
            NormalizeError::Schema {
                expected_key,
                provider_message,
                ..
            } => {
                assert_eq!(expected_key, "Time Series (5min)");
                assert!(provider_message.as_deref().unwrap().contains("demo"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
        assert!(err.to_string().contains("provider said"));
    }

    #[test]
    fn series_for_other_interval_is_schema_error() {
        let p = payload(&[("2024-01-02 09:30:00", fields("1", "2", "0.5", "1.5", "100"))]);
        let n = Normalizer::new(Interval::OneMinute, DuplicatePolicy::default());
        assert!(matches!(
            n.normalize(&msft(), &p),
            Err(NormalizeError::Schema { .. })
        ));
    }

    #[test]
    fn malformed_timestamp_is_parse_error() {
        let p = payload(&[("yesterday", fields("1", "2", "0.5", "1.5", "100"))]);
        let err = Normalizer::default().normalize(&msft(), &p).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::Parse {
                source: ParseError::Timestamp { .. },
                ..
            }
        ));
    }

    #[test]
    fn non_numeric_field_is_parse_error() {
        let p = payload(&[("2024-01-02 09:30:00", fields("1", "n/a", "0.5", "1.5", "100"))]);
        let err = Normalizer::default().normalize(&msft(), &p).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::Parse {
                source: ParseError::InvalidNumber {
                    field: Field::High,
                    ..
                },
                ..
            }
        ));
    }

    #[test]
    fn non_finite_price_is_parse_error() {
        let p = payload(&[("2024-01-02 09:30:00", fields("1", "2", "0.5", "inf", "100"))]);
        assert!(Normalizer::default().normalize(&msft(), &p).is_err());
    }

    #[test]
    fn fractional_volume_is_parse_error() {
        let p = payload(&[("2024-01-02 09:30:00", fields("1", "2", "0.5", "1.5", "10.5"))]);
        assert!(Normalizer::default().normalize(&msft(), &p).is_err());
        let p = payload(&[("2024-01-02 09:30:00", fields("1", "2", "0.5", "1.5", "1200.0"))]);
        let s = Normalizer::default().normalize(&msft(), &p).unwrap();
        assert_eq!(s.first().unwrap().volume, 1200);
    }

    #[test]
    fn missing_field_is_parse_error() {
        let mut f = fields("1", "2", "0.5", "1.5", "100");
        f.remove("5. volume");
        let p = payload(&[("2024-01-02 09:30:00", f)]);
        let err = Normalizer::default().normalize(&msft(), &p).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::Parse {
                source: ParseError::MissingField {
                    field: Field::Volume,
                    ..
                },
                ..
            }
        ));
    }

    #[test]
    fn numeric_json_values_are_accepted() {
        let f: BTreeMap<String, Value> = [
            ("1. open", Value::from(1.0)),
            ("2. high", Value::from(2.0)),
            ("3. low", Value::from(0.5)),
            ("4. close", Value::from(1.5)),
            ("5. volume", Value::from(100u64)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let p = payload(&[("2024-01-02 09:30:00", f)]);
        let s = Normalizer::default().normalize(&msft(), &p).unwrap();
        assert_eq!(s.first().unwrap().close, 1.5);
    }

    fn duplicated() -> RawPayload {
        payload(&[
            ("2024-01-02 09:30:00", fields("1", "2", "0.5", "1.0", "100")),
            ("2024-01-02 09:35:00", fields("1", "2", "0.5", "1.5", "100")),
            // same minute, different spelling
            ("2024-01-02 09:30", fields("1", "2", "0.5", "9.0", "100")),
        ])
    }

    #[test]
    fn duplicates_keep_last_by_default() {
        let s = Normalizer::default().normalize(&msft(), &duplicated()).unwrap();
        assert_eq!(s.closes(), vec![9.0, 1.5]);
    }

    #[test]
    fn duplicates_keep_first() {
        let n = Normalizer::new(Interval::FiveMinutes, DuplicatePolicy::KeepFirst);
        let s = n.normalize(&msft(), &duplicated()).unwrap();
        assert_eq!(s.closes(), vec![1.0, 1.5]);
    }

    #[test]
    fn duplicates_rejected() {
        let n = Normalizer::new(Interval::FiveMinutes, DuplicatePolicy::Reject);
        let err = n.normalize(&msft(), &duplicated()).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::Parse {
                source: ParseError::DuplicateTimestamp { .. },
                ..
            }
        ));
    }

    #[test]
    fn date_only_timestamps_parse_to_midnight() {
        let ts = parse_timestamp("2024-01-02").unwrap();
        assert_eq!(ts.to_string(), "2024-01-02 00:00:00");
    }

    #[test]
    fn detect_anomalies_flags_zero_volume_and_gaps() {
        let p = payload(&[
            ("2024-01-02 09:30:00", fields("1", "2", "0.5", "1.0", "0")),
            ("2024-01-02 09:35:00", fields("1", "2", "0.5", "1.5", "100")),
            // 10-minute gap inside the session
            ("2024-01-02 09:45:00", fields("1", "2", "0.5", "1.5", "0")),
            // overnight gap is not reported
            ("2024-01-03 09:30:00", fields("1", "2", "0.5", "1.5", "100")),
        ]);
        let n = Normalizer::default();
        let s = n.normalize(&msft(), &p).unwrap();
        let anomalies = n.detect_anomalies(&s);

        assert_eq!(anomalies.len(), 2);
        assert_eq!(anomalies[0].anomaly_type, AnomalyType::ZeroVolume);
        assert_eq!(anomalies[0].count, 2);
        assert_eq!(anomalies[1].anomaly_type, AnomalyType::SessionGap);
        assert_eq!(anomalies[1].count, 1);
    }

    #[test]
    fn detect_anomalies_flags_inverted_range() {
        let p = payload(&[("2024-01-02 09:30:00", fields("1", "0.5", "2", "1.0", "10"))]);
        let n = Normalizer::default();
        let s = n.normalize(&msft(), &p).unwrap();
        let anomalies = n.detect_anomalies(&s);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].anomaly_type, AnomalyType::InsaneRange);
        assert_eq!(anomalies[0].severity, Severity::Warning);
    }
}
