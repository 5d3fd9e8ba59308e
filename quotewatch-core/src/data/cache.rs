//! In-memory TTL cache of normalized series.
//!
//! Keyed by a BLAKE3 digest of (credential, symbol, interval) so the secret
//! is never held as a map key. Entries are immutable once stored and expire
//! by time only: the TTL is checked on read and an expired entry is dropped
//! then. There is no background eviction.

use crate::clock::{Clock, SystemClock};
use crate::domain::{ApiKey, Interval, Symbol, TimeSeries};
use chrono::{DateTime, Duration, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Default time-to-live: ten minutes.
pub const DEFAULT_TTL_SECS: u64 = 600;

/// Opaque cache key derived from credential and symbol.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn new(api_key: &ApiKey, symbol: &Symbol, interval: Interval) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(api_key.expose().as_bytes());
        hasher.update(&[0]);
        hasher.update(symbol.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(interval.as_str().as_bytes());
        Self(*hasher.finalize().as_bytes())
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short prefix is enough to correlate log lines.
        let hex: String = self.0[..4].iter().map(|b| format!("{b:02x}")).collect();
        write!(f, "CacheKey({hex})")
    }
}

/// A stored series and when it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSeries {
    pub series: TimeSeries,
    pub fetched_at: DateTime<Utc>,
}

pub struct SeriesCache<C: Clock = SystemClock> {
    entries: HashMap<CacheKey, CachedSeries>,
    ttl: Duration,
    clock: C,
}

impl SeriesCache<SystemClock> {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<C: Clock> SeriesCache<C> {
    pub fn with_clock(ttl: std::time::Duration, clock: C) -> Self {
        Self {
            entries: HashMap::new(),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(365 * 100)),
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Fresh entry for `key`, if any. Drops the entry if it has expired.
    pub fn get(&mut self, key: &CacheKey) -> Option<&CachedSeries> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            None => {
                debug!(?key, "cache miss");
                return None;
            }
            Some(entry) => now - entry.fetched_at >= self.ttl,
        };

        if expired {
            debug!(?key, "cache entry expired");
            self.entries.remove(key);
            return None;
        }

        debug!(?key, "cache hit");
        self.entries.get(key)
    }

    /// Store a freshly fetched series, stamped with the current time.
    ///
    /// A fresh entry already under `key` is left as it is.
    pub fn put(&mut self, key: CacheKey, series: TimeSeries) -> &CachedSeries {
        let fresh = CachedSeries {
            series,
            fetched_at: self.clock.now(),
        };
        match self.entries.entry(key) {
            Entry::Vacant(slot) => slot.insert(fresh),
            Entry::Occupied(mut slot) => {
                if fresh.fetched_at - slot.get().fetched_at >= self.ttl {
                    slot.insert(fresh);
                }
                slot.into_mut()
            }
        }
    }

    /// Number of stored entries, expired ones included until read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::indicators::make_points;
    use chrono::TimeZone;

    fn series(symbol: &str, closes: &[f64]) -> TimeSeries {
        TimeSeries::new(
            Symbol::new(symbol).unwrap(),
            Interval::FiveMinutes,
            make_points(closes),
        )
        .unwrap()
    }

    fn key(api: &str, sym: &str) -> CacheKey {
        CacheKey::new(
            &ApiKey::new(api).unwrap(),
            &Symbol::new(sym).unwrap(),
            Interval::FiveMinutes,
        )
    }

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap())
    }

    #[test]
    fn key_depends_on_credential_and_symbol() {
        assert_eq!(key("k1", "msft"), key("k1", "MSFT"));
        assert_ne!(key("k1", "MSFT"), key("k2", "MSFT"));
        assert_ne!(key("k1", "MSFT"), key("k1", "AAPL"));
        let other_interval = CacheKey::new(
            &ApiKey::new("k1").unwrap(),
            &Symbol::new("MSFT").unwrap(),
            Interval::OneMinute,
        );
        assert_ne!(key("k1", "MSFT"), other_interval);
    }

    #[test]
    fn key_debug_does_not_leak_secret() {
        let dbg = format!("{:?}", key("SUPERSECRET", "MSFT"));
        assert!(!dbg.contains("SUPERSECRET"));
        assert!(dbg.starts_with("CacheKey("));
    }

    #[test]
    fn hit_within_ttl() {
        let mut cache = SeriesCache::with_clock(std::time::Duration::from_secs(600), clock());
        let k = key("k", "MSFT");
        cache.put(k, series("MSFT", &[1.0, 2.0]));

        cache.clock().advance(Duration::seconds(599));
        let hit = cache.get(&k).unwrap();
        assert_eq!(hit.series.len(), 2);
    }

    #[test]
    fn expires_at_ttl_and_is_dropped_on_read() {
        let mut cache = SeriesCache::with_clock(std::time::Duration::from_secs(600), clock());
        let k = key("k", "MSFT");
        cache.put(k, series("MSFT", &[1.0, 2.0]));
        assert_eq!(cache.len(), 1);

        cache.clock().advance(Duration::seconds(600));
        assert!(cache.get(&k).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn fresh_entry_is_not_overwritten() {
        let mut cache = SeriesCache::with_clock(std::time::Duration::from_secs(600), clock());
        let k = key("k", "MSFT");
        cache.put(k, series("MSFT", &[1.0, 2.0]));
        cache.clock().advance(Duration::seconds(10));
        let stored = cache.put(k, series("MSFT", &[7.0, 8.0, 9.0]));
        assert_eq!(stored.series.len(), 2);
    }

    #[test]
    fn expired_entry_is_replaced_on_put() {
        let mut cache = SeriesCache::with_clock(std::time::Duration::from_secs(60), clock());
        let k = key("k", "MSFT");
        cache.put(k, series("MSFT", &[1.0, 2.0]));
        cache.clock().advance(Duration::seconds(61));
        let now = cache.clock().now();
        let stored = cache.put(k, series("MSFT", &[7.0, 8.0, 9.0]));
        assert_eq!(stored.series.len(), 3);
        assert_eq!(stored.fetched_at, now);
    }

    #[test]
    fn entries_are_isolated_per_key() {
        let mut cache = SeriesCache::with_clock(std::time::Duration::from_secs(600), clock());
        cache.put(key("k", "MSFT"), series("MSFT", &[1.0, 2.0]));
        assert!(cache.get(&key("k", "AAPL")).is_none());
        assert!(cache.get(&key("other", "MSFT")).is_none());
        assert!(cache.get(&key("k", "MSFT")).is_some());
    }
}
