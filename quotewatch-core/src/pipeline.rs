//! One dashboard interaction: cache → fetch → normalize → annotate → snapshot.
//!
//! Strictly sequential. Each call runs to completion and either returns a
//! full view or a terminal error; the caller decides whether to try again on
//! the next interaction.

use crate::clock::{Clock, SystemClock};
use crate::data::{
    AnomalyReport, CacheKey, DataSource, DuplicatePolicy, Normalizer, SeriesCache,
};
use crate::domain::{ApiKey, Interval, Symbol, TimeSeries};
use crate::error::DashboardError;
use crate::indicators::{annotate, AnnotatedSeries, IndicatorParams};
use crate::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Everything the renderer needs for one interaction. Read-only.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub series: AnnotatedSeries,
    pub snapshot: Snapshot,
    pub fetched_at: DateTime<Utc>,
    pub from_cache: bool,
    pub anomalies: Vec<AnomalyReport>,
}

pub struct Dashboard<S: DataSource, C: Clock = SystemClock> {
    source: S,
    normalizer: Normalizer,
    cache: SeriesCache<C>,
}

impl<S: DataSource> Dashboard<S, SystemClock> {
    pub fn new(
        source: S,
        interval: Interval,
        duplicate_policy: DuplicatePolicy,
        ttl: Duration,
    ) -> Self {
        Self::with_cache(
            source,
            Normalizer::new(interval, duplicate_policy),
            SeriesCache::new(ttl),
        )
    }
}

impl<S: DataSource, C: Clock> Dashboard<S, C> {
    pub fn with_cache(source: S, normalizer: Normalizer, cache: SeriesCache<C>) -> Self {
        Self {
            source,
            normalizer,
            cache,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &SeriesCache<C> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut SeriesCache<C> {
        &mut self.cache
    }

    /// Run the full pipeline for one symbol with the given indicator windows.
    pub fn load(
        &mut self,
        api_key: &ApiKey,
        symbol: &Symbol,
        params: &IndicatorParams,
    ) -> Result<DashboardView, DashboardError> {
        params.validate()?;

        let (series, fetched_at, from_cache) = self.series_for(api_key, symbol)?;

        let snapshot = Snapshot::from_series(&series)?;
        let anomalies = self.normalizer.detect_anomalies(&series);
        for a in &anomalies {
            warn!(symbol = %symbol, anomaly = ?a.anomaly_type, count = a.count, "data anomaly");
        }

        let series = annotate(series, params)?;
        info!(
            symbol = %symbol,
            points = series.len(),
            from_cache,
            latest = snapshot.latest_close,
            "dashboard ready"
        );

        Ok(DashboardView {
            series,
            snapshot,
            fetched_at,
            from_cache,
            anomalies,
        })
    }

    /// Cached series if fresh, otherwise fetch and normalize, caching success only.
    fn series_for(
        &mut self,
        api_key: &ApiKey,
        symbol: &Symbol,
    ) -> Result<(TimeSeries, DateTime<Utc>, bool), DashboardError> {
        let key = CacheKey::new(api_key, symbol, self.normalizer.interval());
        if let Some(hit) = self.cache.get(&key) {
            return Ok((hit.series.clone(), hit.fetched_at, true));
        }

        let payload = self.source.fetch(api_key, symbol).map_err(|e| {
            warn!(symbol = %symbol, source = self.source.name(), error = %e, "fetch failed");
            e
        })?;
        let series = self.normalizer.normalize(symbol, &payload)?;
        info!(
            symbol = %symbol,
            source = self.source.name(),
            points = series.len(),
            "fetched and normalized series"
        );

        let stored = self.cache.put(key, series);
        Ok((stored.series.clone(), stored.fetched_at, false))
    }
}
