//! Data source trait and fetch errors.
//!
//! The DataSource trait abstracts over where a payload comes from (the
//! Alpha Vantage HTTP API, a saved file, a synthetic generator) so the
//! pipeline can swap implementations and tests can count calls.

use super::payload::RawPayload;
use crate::domain::{ApiKey, Symbol};
use thiserror::Error;

/// Failure to obtain a decodable payload.
///
/// Terminal for the current interaction; nothing retries.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("API request failed: {0}")]
    Network(String),

    #[error("API request failed: HTTP {status} for {symbol}")]
    HttpStatus { status: u16, symbol: String },

    #[error("API response is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("could not read payload file {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Where a raw payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    AlphaVantage,
    File,
    Synthetic,
}

/// Anything that can produce a raw intraday payload for a symbol.
///
/// Sources know nothing about the cache; the pipeline sits above them.
pub trait DataSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    fn kind(&self) -> SourceKind;

    /// Fetch the raw payload for one symbol. Single attempt, no retry.
    fn fetch(&self, api_key: &ApiKey, symbol: &Symbol) -> Result<RawPayload, FetchError>;
}

impl<T: DataSource + ?Sized> DataSource for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn kind(&self) -> SourceKind {
        (**self).kind()
    }

    fn fetch(&self, api_key: &ApiKey, symbol: &Symbol) -> Result<RawPayload, FetchError> {
        (**self).fetch(api_key, symbol)
    }
}

impl<T: DataSource + ?Sized> DataSource for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn kind(&self) -> SourceKind {
        (**self).kind()
    }

    fn fetch(&self, api_key: &ApiKey, symbol: &Symbol) -> Result<RawPayload, FetchError> {
        (**self).fetch(api_key, symbol)
    }
}
