//! Time-to-live cache keyed by symbol and calendar-day bucket.
//!
//! An entry is served only while it is younger than the TTL *and* was stored
//! on the current UTC day, so nothing fetched before midnight survives into
//! the next session even with a long TTL.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use dashmap::DashMap;

pub const DEFAULT_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub bucket: NaiveDate,
}

impl CacheKey {
    pub fn new(symbol: &str, at: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_string(),
            bucket: at.date_naive(),
        }
    }
}

struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

pub struct TtlCache<T> {
    entries: DashMap<CacheKey, CacheEntry<T>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, symbol: &str) -> Option<T> {
        self.get_at(symbol, Utc::now())
    }

    pub fn insert(&self, symbol: &str, data: T) {
        self.insert_at(symbol, data, Utc::now());
    }

    fn get_at(&self, symbol: &str, now: DateTime<Utc>) -> Option<T> {
        let entry = self.entries.get(&CacheKey::new(symbol, now))?;
        if now - entry.cached_at >= self.ttl {
            return None;
        }
        Some(entry.data.clone())
    }

    fn insert_at(&self, symbol: &str, data: T, now: DateTime<Utc>) {
        self.entries.insert(
            CacheKey::new(symbol, now),
            CacheEntry {
                data,
                cached_at: now,
            },
        );
    }

    /// Drop every bucket for `symbol`. Returns the number of entries removed.
    pub fn invalidate(&self, symbol: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.symbol != symbol);
        before - self.entries.len()
    }

    pub fn invalidate_all(&self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    /// Remove entries that can no longer be served.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let today = now.date_naive();
        let before = self.entries.len();
        self.entries
            .retain(|key, entry| key.bucket == today && now - entry.cached_at < self.ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = TtlCache::new(Duration::minutes(60));
        cache.insert_at("TCS", 1u32, at(9, 0));
        assert_eq!(cache.get_at("TCS", at(9, 59)), Some(1));
    }

    #[test]
    fn test_miss_after_ttl() {
        let cache = TtlCache::new(Duration::minutes(60));
        cache.insert_at("TCS", 1u32, at(9, 0));
        assert_eq!(cache.get_at("TCS", at(10, 0)), None);
    }

    #[test]
    fn test_miss_on_new_day_bucket() {
        let cache = TtlCache::new(Duration::hours(24));
        cache.insert_at("TCS", 1u32, at(23, 50));
        let next_day = Utc.with_ymd_and_hms(2026, 10, 17, 0, 5, 0).unwrap();
        assert_eq!(cache.get_at("TCS", next_day), None);
    }

    #[test]
    fn test_invalidate_symbol() {
        let cache = TtlCache::default();
        cache.insert("TCS", 1u32);
        cache.insert("INFY", 2u32);

        assert_eq!(cache.invalidate("TCS"), 1);
        assert_eq!(cache.get("TCS"), None);
        assert_eq!(cache.get("INFY"), Some(2));
        assert_eq!(cache.invalidate("TCS"), 0);
    }

    #[test]
    fn test_invalidate_all() {
        let cache = TtlCache::default();
        cache.insert("TCS", 1u32);
        cache.insert("INFY", 2u32);

        assert_eq!(cache.invalidate_all(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let cache = TtlCache::new(Duration::minutes(30));
        cache.insert_at("OLD", 1u32, at(8, 0));
        cache.insert_at("FRESH", 2u32, at(9, 0));

        assert_eq!(cache.purge_expired_at(at(9, 10)), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at("FRESH", at(9, 10)), Some(2));
    }
}
