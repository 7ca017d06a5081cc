//! Caching wrapper around any [`PriceDataSource`].
//!
//! Entries are keyed by `(ticker, start, end)` and hold immutable series
//! snapshots, so a cache hit returns exactly what the inner source returned.
//! Expiry is governed by an explicit [`CachePolicy`]; nothing is global.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use super::provider::{DataError, PriceDataSource};
use crate::domain::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// How long an entry stays fresh.
    pub ttl: Duration,
    /// Upper bound on cached entries; the oldest is evicted first.
    pub max_entries: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            max_entries: 256,
        }
    }
}

type CacheKey = (String, NaiveDate, NaiveDate);

#[derive(Debug)]
struct Entry {
    series: PriceSeries,
    fetched_at: Instant,
}

pub struct CachedSource<S> {
    inner: S,
    policy: CachePolicy,
    name: String,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl<S: PriceDataSource> CachedSource<S> {
    pub fn new(inner: S, policy: CachePolicy) -> Self {
        let name = format!("cached({})", inner.name());
        Self {
            inner,
            policy,
            name,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop cached entries for one ticker, or everything when `None`.
    pub fn clear(&self, ticker: Option<&str>) {
        let mut entries = self.lock();
        match ticker {
            Some(t) => entries.retain(|(cached, _, _), _| cached != t),
            None => entries.clear(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Entry>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn evict_to_capacity(entries: &mut HashMap<CacheKey, Entry>, max_entries: usize) {
        while entries.len() > max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.fetched_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl<S: PriceDataSource> PriceDataSource for CachedSource<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_price_series(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let key = (ticker.to_string(), start, end);
        {
            let entries = self.lock();
            if let Some(entry) = entries.get(&key) {
                if entry.fetched_at.elapsed() < self.policy.ttl {
                    tracing::debug!(ticker, %start, %end, "price cache hit");
                    return Ok(entry.series.clone());
                }
            }
        }

        // Fetch outside the lock so slow sources don't serialize other tickers.
        let series = self.inner.load_price_series(ticker, start, end)?;

        if self.policy.max_entries > 0 {
            let mut entries = self.lock();
            entries.insert(
                key,
                Entry {
                    series: series.clone(),
                    fetched_at: Instant::now(),
                },
            );
            Self::evict_to_capacity(&mut entries, self.policy.max_entries);
        }
        Ok(series)
    }
}
