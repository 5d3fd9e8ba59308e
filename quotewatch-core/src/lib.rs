//! quotewatch core: intraday price series, indicators, and headline metrics.
//!
//! Pipeline for one interaction:
//! - a `DataSource` returns the provider's raw payload
//! - the `Normalizer` turns it into a sorted `TimeSeries`
//! - the indicator engine annotates it with two SMAs and an RSI
//! - the snapshot reducer extracts latest price, change, and range
//!
//! A TTL cache keyed by (credential, symbol) sits in front of the source.
//! Rendering is left to the caller.

pub mod clock;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod export;
pub mod indicators;
pub mod pipeline;
pub mod snapshot;

pub use config::{ChartType, DashboardConfig};
pub use error::DashboardError;
pub use pipeline::{Dashboard, DashboardView};
pub use snapshot::{Snapshot, SnapshotError};
