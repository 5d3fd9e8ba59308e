//! Synthetic intraday payloads for demos and tests without an API key.
//!
//! Each symbol gets its own deterministic random walk: the walk's seed is a
//! BLAKE3 hash of the master seed and the symbol, so replaying a symbol
//! yields the same payload regardless of what else was generated before.

use super::payload::{RawPayload, RawSeries};
use super::provider::{DataSource, FetchError, SourceKind};
use crate::domain::{ApiKey, Interval, Symbol};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::collections::BTreeMap;

const SESSION_OPEN: (u32, u32) = (9, 30);
const SESSION_CLOSE: (u32, u32) = (16, 0);

#[derive(Debug, Clone)]
pub struct SyntheticSource {
    master_seed: u64,
    interval: Interval,
    points: usize,
    start: NaiveDateTime,
    start_price: f64,
}

impl SyntheticSource {
    pub fn new(master_seed: u64, interval: Interval, points: usize) -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(SESSION_OPEN.0, SESSION_OPEN.1, 0))
            .unwrap_or_default();
        Self {
            master_seed,
            interval,
            points,
            start,
            start_price: 100.0,
        }
    }

    pub fn with_start(mut self, start: NaiveDateTime) -> Self {
        self.start = start;
        self
    }

    pub fn with_start_price(mut self, price: f64) -> Self {
        self.start_price = price;
        self
    }

    /// Deterministic per-symbol seed.
    pub fn seed_for(&self, symbol: &Symbol) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(symbol.as_str().as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Build a payload shaped exactly like the provider's response.
    pub fn generate(&self, symbol: &Symbol) -> RawPayload {
        let mut rng = StdRng::seed_from_u64(self.seed_for(symbol));
        let step = Duration::minutes(self.interval.minutes());

        let mut rows = Vec::with_capacity(self.points);
        let mut ts = self.start;
        let mut prev_close = self.start_price;

        for _ in 0..self.points {
            let open = prev_close;
            let close = (open * (1.0 + rng.gen_range(-0.004..0.004))).max(0.01);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.002));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.002));
            let volume: u64 = rng.gen_range(1_000..50_000);
            rows.push((ts, open, high, low, close, volume));

            prev_close = close;
            ts = next_session_time(ts, step);
        }

        // The provider lists newest first.
        let mut series = RawSeries::new();
        for (ts, open, high, low, close, volume) in rows.into_iter().rev() {
            let fields: BTreeMap<String, Value> = [
                ("1. open", format!("{open:.4}")),
                ("2. high", format!("{high:.4}")),
                ("3. low", format!("{low:.4}")),
                ("4. close", format!("{close:.4}")),
                ("5. volume", volume.to_string()),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::String(v)))
            .collect();
            series.push(ts.format("%Y-%m-%d %H:%M:%S").to_string(), fields);
        }

        RawPayload::new()
            .with_field(
                "Meta Data",
                json!({
                    "1. Information": "Synthetic intraday prices",
                    "2. Symbol": symbol.as_str(),
                    "4. Interval": self.interval.as_str(),
                }),
            )
            .with_series(self.interval.series_key(), series)
    }
}

/// Next bar time inside regular weekday trading hours.
fn next_session_time(ts: NaiveDateTime, step: Duration) -> NaiveDateTime {
    let close = NaiveTime::from_hms_opt(SESSION_CLOSE.0, SESSION_CLOSE.1, 0).unwrap_or_default();
    let open = NaiveTime::from_hms_opt(SESSION_OPEN.0, SESSION_OPEN.1, 0).unwrap_or_default();

    let next = ts + step;
    if next.time() < close && next.date() == ts.date() {
        return next;
    }

    let mut day = ts.date() + Duration::days(1);
    while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
        day += Duration::days(1);
    }
    day.and_time(open)
}

impl DataSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Synthetic
    }

    fn fetch(&self, _api_key: &ApiKey, symbol: &Symbol) -> Result<RawPayload, FetchError> {
        Ok(self.generate(symbol))
    }
}
