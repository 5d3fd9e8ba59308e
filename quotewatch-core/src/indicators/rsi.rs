//! Relative Strength Index (RSI).
//!
//! Simple rolling means of gains and losses (not Wilder smoothing):
//! RSI = 100 - 100 / (1 + mean_gain / mean_loss)
//! The first point has no prior close and contributes zero gain and zero
//! loss, so the lookback is period - 1, as for SMA.
//! Edge cases: mean_loss == 0 with mean_gain > 0 → 100; both zero → None.

use super::rolling::rolling_mean;
use super::Indicator;
use crate::domain::PricePoint;

/// Value when there were no losses in the window.
pub const RSI_SATURATED: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub const DEFAULT_PERIOD: usize = 14;

    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PERIOD)
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, points: &[PricePoint]) -> Vec<Option<f64>> {
        let n = points.len();
        let mut gains = vec![0.0; n];
        let mut losses = vec![0.0; n];
        for i in 1..n {
            let change = points[i].close - points[i - 1].close;
            if change > 0.0 {
                gains[i] = change;
            } else if change < 0.0 {
                losses[i] = -change;
            }
        }

        let mean_gains = rolling_mean(&gains, self.period);
        let mean_losses = rolling_mean(&losses, self.period);

        mean_gains
            .into_iter()
            .zip(mean_losses)
            .map(|(g, l)| match (g, l) {
                (Some(g), Some(l)) => rsi_from_means(g, l),
                _ => None,
            })
            .collect()
    }
}

/// RSI from trailing mean gain and mean loss.
///
/// Zero mean loss saturates at 100 instead of dividing by zero. A flat window
/// (both means zero) has no defined RSI.
pub fn rsi_from_means(mean_gain: f64, mean_loss: f64) -> Option<f64> {
    if mean_loss == 0.0 {
        if mean_gain > 0.0 {
            Some(RSI_SATURATED)
        } else {
            None
        }
    } else {
        let rs = mean_gain / mean_loss;
        Some(100.0 - 100.0 / (1.0 + rs))
    }
}
