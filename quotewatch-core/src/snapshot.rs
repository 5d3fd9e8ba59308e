//! Snapshot reducer: headline metrics from the tail of a series.

use crate::domain::TimeSeries;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("need at least {required} points for a snapshot, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("previous close is zero; percentage change is undefined")]
    ZeroPreviousClose,
}

/// Latest price, change against the previous point, and the series range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub symbol: String,
    pub as_of: NaiveDateTime,
    pub latest_close: f64,
    pub prev_close: f64,
    pub change: f64,
    pub change_pct: f64,
    /// Highest high over the whole series.
    pub day_high: f64,
    /// Lowest low over the whole series.
    pub day_low: f64,
}

impl Snapshot {
    pub const MIN_POINTS: usize = 2;

    pub fn from_series(series: &TimeSeries) -> Result<Self, SnapshotError> {
        let points = series.points();
        let [.., prev, last] = points else {
            return Err(SnapshotError::InsufficientData {
                required: Self::MIN_POINTS,
                actual: points.len(),
            });
        };

        if prev.close == 0.0 {
            return Err(SnapshotError::ZeroPreviousClose);
        }

        let change = last.close - prev.close;
        let day_high = points.iter().map(|p| p.high).fold(f64::NEG_INFINITY, f64::max);
        let day_low = points.iter().map(|p| p.low).fold(f64::INFINITY, f64::min);

        Ok(Self {
            symbol: series.symbol().to_string(),
            as_of: last.timestamp,
            latest_close: last.close,
            prev_close: prev.close,
            change,
            change_pct: 100.0 * change / prev.close,
            day_high,
            day_low,
        })
    }

    pub fn is_up(&self) -> bool {
        self.change > 0.0
    }
}
