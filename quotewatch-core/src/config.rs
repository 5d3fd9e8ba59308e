//! Dashboard configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration: 5-minute bars, full output, SMA 20/50, RSI 14,
//! ten-minute cache.

use crate::data::alpha_vantage::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use crate::data::cache::DEFAULT_TTL_SECS;
use crate::data::{DuplicatePolicy, OutputSize};
use crate::domain::Interval;
use crate::indicators::IndicatorParams;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Allowed short SMA window.
pub const SMA_SHORT_RANGE: RangeInclusive<usize> = 5..=50;
/// Allowed long SMA window.
pub const SMA_LONG_RANGE: RangeInclusive<usize> = 50..=200;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("{field} must be in {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },

    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    #[default]
    Candlestick,
    Line,
}

impl std::str::FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "candlestick" => Ok(ChartType::Candlestick),
            "line" => Ok(ChartType::Line),
            _ => Err(format!("unknown chart type '{s}'. Valid: candlestick, line")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub endpoint: String,
    pub interval: Interval,
    pub output_size: OutputSize,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            interval: Interval::default(),
            output_size: OutputSize::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub duplicate_policy: DuplicatePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub chart_type: ChartType,
    /// Rows of the raw-data table, newest first.
    pub rows: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            chart_type: ChartType::default(),
            rows: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub source: SourceConfig,
    pub indicators: IndicatorParams,
    pub cache: CacheConfig,
    pub normalize: NormalizeConfig,
    pub display: DisplayConfig,
}

impl DashboardConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "indicators.sma_short_window",
            self.indicators.sma_short_window,
            SMA_SHORT_RANGE,
        )?;
        check_range(
            "indicators.sma_long_window",
            self.indicators.sma_long_window,
            SMA_LONG_RANGE,
        )?;
        if self.indicators.rsi_window == 0 {
            return Err(ConfigError::Zero {
                field: "indicators.rsi_window",
            });
        }
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Zero {
                field: "cache.ttl_secs",
            });
        }
        if self.source.timeout_secs == 0 {
            return Err(ConfigError::Zero {
                field: "source.timeout_secs",
            });
        }
        if self.display.rows == 0 {
            return Err(ConfigError::Zero {
                field: "display.rows",
            });
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_secs)
    }
}

fn check_range(
    field: &'static str,
    value: usize,
    range: RangeInclusive<usize>,
) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}
