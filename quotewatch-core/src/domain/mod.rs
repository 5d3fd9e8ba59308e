//! Domain types: price points, series, symbols, credentials.

pub mod interval;
pub mod price_point;
pub mod series;
pub mod symbol;

pub use interval::Interval;
pub use price_point::PricePoint;
pub use series::{SeriesError, TimeSeries};
pub use symbol::{ApiKey, InputError, Symbol};
