//! Indicator engine.
//!
//! Indicators are pure functions: price history in, one value per point out.
//! A value is `None` until the indicator's window is full, and wherever the
//! indicator is mathematically undefined (flat-price RSI).
//!
//! No indicator value at index t may depend on points after t.

pub mod annotate;
pub mod params;
pub mod rolling;
pub mod rsi;
pub mod sma;

pub use annotate::{annotate, AnnotatedRow, AnnotatedSeries, RsiZone, SmaTrend};
pub use params::{IndicatorParams, ParamsError};
pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::PricePoint;

/// Trait for indicators over a price series.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of points before the first defined value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire series.
    ///
    /// Returns one entry per point; the first `lookback()` are `None`.
    fn compute(&self, points: &[PricePoint]) -> Vec<Option<f64>>;
}

/// Create synthetic points from close prices for testing.
///
/// open = prev_close (or close for the first point),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000,
/// spaced five minutes apart.
#[cfg(test)]
pub fn make_points(closes: &[f64]) -> Vec<PricePoint> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PricePoint {
                timestamp: base + chrono::Duration::minutes(5 * i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert a defined value is approximately equal to `expected`.
#[cfg(test)]
pub fn assert_approx(actual: Option<f64>, expected: f64, epsilon: f64) {
    let actual = actual.unwrap_or_else(|| panic!("expected {expected}, got None"));
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
