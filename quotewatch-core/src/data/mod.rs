//! Data ingestion: sources, payload decoding, normalization, caching.

pub mod alpha_vantage;
pub mod cache;
pub mod file;
pub mod normalize;
pub mod payload;
pub mod provider;
pub mod synthetic;

pub use alpha_vantage::{AlphaVantageSource, OutputSize};
pub use cache::{CacheKey, CachedSeries, SeriesCache};
pub use file::FileSource;
pub use normalize::{
    AnomalyReport, AnomalyType, DuplicatePolicy, NormalizeError, Normalizer, ParseError, Severity,
};
pub use payload::{RawEntry, RawPayload, RawSeries};
pub use provider::{DataSource, FetchError, SourceKind};
pub use synthetic::SyntheticSource;
