//! Indicator window configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error("{name} must be at least 1, got {value}")]
    ZeroWindow { name: &'static str, value: usize },
}

/// Windows for the two SMAs and the RSI.
///
/// `sma_short_window < sma_long_window` is conventional and not checked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub sma_short_window: usize,
    pub sma_long_window: usize,
    pub rsi_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_short_window: 20,
            sma_long_window: 50,
            rsi_window: super::Rsi::DEFAULT_PERIOD,
        }
    }
}

impl IndicatorParams {
    pub fn new(
        sma_short_window: usize,
        sma_long_window: usize,
        rsi_window: usize,
    ) -> Result<Self, ParamsError> {
        let params = Self {
            sma_short_window,
            sma_long_window,
            rsi_window,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        for (name, value) in [
            ("sma_short_window", self.sma_short_window),
            ("sma_long_window", self.sma_long_window),
            ("rsi_window", self.rsi_window),
        ] {
            if value == 0 {
                return Err(ParamsError::ZeroWindow { name, value });
            }
        }
        Ok(())
    }
}
