//! TimeSeries: an ordered run of price points for one symbol.

use super::{Interval, PricePoint, Symbol};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("timestamps must be strictly increasing: {previous} is followed by {current} at index {index}")]
    NotStrictlyIncreasing {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },
}

/// Price points sorted strictly ascending by timestamp.
///
/// Built once per fetch and never mutated afterwards. Derived columns live
/// in `AnnotatedSeries`, aligned by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesParts")]
pub struct TimeSeries {
    symbol: Symbol,
    interval: Interval,
    points: Vec<PricePoint>,
}

/// Wire form of `TimeSeries`; deserialization goes through `TimeSeries::new`.
#[derive(Deserialize)]
struct SeriesParts {
    symbol: Symbol,
    interval: Interval,
    points: Vec<PricePoint>,
}

impl TryFrom<SeriesParts> for TimeSeries {
    type Error = SeriesError;

    fn try_from(parts: SeriesParts) -> Result<Self, Self::Error> {
        TimeSeries::new(parts.symbol, parts.interval, parts.points)
    }
}

impl TimeSeries {
    /// Build a series, rejecting out-of-order or repeated timestamps.
    pub fn new(
        symbol: Symbol,
        interval: Interval,
        points: Vec<PricePoint>,
    ) -> Result<Self, SeriesError> {
        for (index, pair) in points.windows(2).enumerate() {
            if pair[0].timestamp >= pair[1].timestamp {
                return Err(SeriesError::NotStrictlyIncreasing {
                    index: index + 1,
                    previous: pair[0].timestamp,
                    current: pair[1].timestamp,
                });
            }
        }
        Ok(Self {
            symbol,
            interval,
            points,
        })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }
}
