//! In-memory session cache with request coalescing.
//!
//! Keyed by (instrument, start, end, granularity). Guarantees at most one
//! in-flight fetch per key: the first caller fetches outside the map lock,
//! later callers for the same key block on that flight and receive the same
//! result or the same error. Failures are not cached.
//!
//! A request whose range lies inside an already cached range for the same
//! instrument and granularity is answered from that entry, trimmed to the
//! requested bounds. Anything else is a miss; ranges are never stitched.
//! A hit that holds no bars fails with `NoDataInRange`, exactly as a cold
//! fetch of the same range would.

use super::fetcher::{DataFetcher, FetchedSeries};
use crate::domain::{Granularity, Instrument};
use crate::error::FetchError;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use tracing::debug;

type SharedResult = Result<Arc<FetchedSeries>, FetchError>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub instrument: Instrument,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
}

impl CacheKey {
    pub fn new(
        instrument: Instrument,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> Self {
        Self {
            instrument,
            start,
            end,
            granularity,
        }
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub coalesced: u64,
    pub failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    failures: AtomicU64,
}

/// One fetch in progress; waiters park on `done` until `result` is set.
#[derive(Debug, Default)]
struct Flight {
    result: Mutex<Option<SharedResult>>,
    done: Condvar,
}

impl Flight {
    fn complete(&self, result: SharedResult) {
        let mut slot = self.result.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(result);
        self.done.notify_all();
    }

    fn wait(&self) -> SharedResult {
        let mut slot = self.result.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            slot = self
                .done
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

#[derive(Debug)]
enum Slot {
    Ready(Arc<FetchedSeries>),
    InFlight(Arc<Flight>),
}

#[derive(Debug, Default)]
struct Inner {
    slots: HashMap<CacheKey, Slot>,
    /// Ready keys in insertion order, oldest first.
    order: VecDeque<CacheKey>,
}

impl Inner {
    fn covering(&self, key: &CacheKey) -> Option<Arc<FetchedSeries>> {
        self.slots.iter().find_map(|(k, slot)| match slot {
            Slot::Ready(series)
                if k.instrument == key.instrument
                    && k.granularity == key.granularity
                    && series.series.covers(key.start, key.end) =>
            {
                Some(series.clone())
            }
            _ => None,
        })
    }

    fn store(&mut self, key: CacheKey, series: Arc<FetchedSeries>, max_entries: Option<usize>) {
        if !matches!(self.slots.get(&key), Some(Slot::Ready(_))) {
            self.order.push_back(key.clone());
        }
        self.slots.insert(key, Slot::Ready(series));

        if let Some(max) = max_entries {
            while self.order.len() > max {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                debug!(instrument = %oldest.instrument, "evicting cached series");
                self.slots.remove(&oldest);
            }
        }
    }
}

enum Lookup {
    Hit(Arc<FetchedSeries>),
    Wait(Arc<Flight>),
    Lead(Arc<Flight>),
}

/// Removes the in-flight slot and wakes waiters if the leader unwinds
/// before completing its flight.
struct FlightGuard<'a> {
    cache: &'a SeriesCache,
    key: &'a CacheKey,
    flight: Arc<Flight>,
    armed: bool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.cache.lock().slots.remove(self.key);
            self.flight
                .complete(Err(FetchError::Provider("fetch aborted".into())));
        }
    }
}

/// Explicitly owned, injectable series cache. Share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct SeriesCache {
    inner: Mutex<Inner>,
    max_entries: Option<usize>,
    counters: Counters,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `max_entries` series; the oldest insert is evicted first.
    pub fn with_max_entries(max_entries: Option<usize>) -> Self {
        Self {
            max_entries,
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached series for `key`, fetching it through `fetcher` on a miss.
    pub fn get_or_fetch(&self, key: &CacheKey, fetcher: &DataFetcher) -> SharedResult {
        self.get_or_fetch_with(key, || {
            fetcher.fetch(&key.instrument, key.start, key.end, key.granularity)
        })
    }

    /// Same as [`get_or_fetch`](Self::get_or_fetch) with an arbitrary fetch closure.
    pub fn get_or_fetch_with<F>(&self, key: &CacheKey, fetch: F) -> SharedResult
    where
        F: FnOnce() -> Result<FetchedSeries, FetchError>,
    {
        let lookup = {
            let mut inner = self.lock();
            let existing = match inner.slots.get(key) {
                Some(Slot::Ready(series)) => Some(Lookup::Hit(series.clone())),
                Some(Slot::InFlight(flight)) => Some(Lookup::Wait(flight.clone())),
                None => None,
            };
            if let Some(found) = existing {
                found
            } else if let Some(wider) = inner.covering(key) {
                Lookup::Hit(Arc::new(wider.trimmed(key.start, key.end)))
            } else {
                let flight = Arc::new(Flight::default());
                inner
                    .slots
                    .insert(key.clone(), Slot::InFlight(flight.clone()));
                Lookup::Lead(flight)
            }
        };

        match lookup {
            Lookup::Hit(series) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(instrument = %key.instrument, start = %key.start, end = %key.end, "cache hit");
                if series.series.bars.is_empty() {
                    return Err(FetchError::NoDataInRange {
                        ticker: key.instrument.provider_ticker(),
                        start: key.start,
                        end: key.end,
                    });
                }
                Ok(series)
            }
            Lookup::Wait(flight) => {
                self.counters.coalesced.fetch_add(1, Ordering::Relaxed);
                debug!(instrument = %key.instrument, "waiting on in-flight fetch");
                flight.wait()
            }
            Lookup::Lead(flight) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!(instrument = %key.instrument, start = %key.start, end = %key.end, "cache miss");

                let mut guard = FlightGuard {
                    cache: self,
                    key,
                    flight,
                    armed: true,
                };
                let result = fetch().map(Arc::new);

                {
                    let mut inner = self.lock();
                    match &result {
                        Ok(series) => inner.store(key.clone(), series.clone(), self.max_entries),
                        Err(_) => {
                            self.counters.failures.fetch_add(1, Ordering::Relaxed);
                            inner.slots.remove(key);
                        }
                    }
                }
                guard.armed = false;
                guard.flight.complete(result.clone());
                result
            }
        }
    }

    /// Pre-seed the cache, replacing any ready entry for the key.
    pub fn insert(&self, key: CacheKey, series: FetchedSeries) {
        self.lock().store(key, Arc::new(series), self.max_entries);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        matches!(self.lock().slots.get(key), Some(Slot::Ready(_)))
    }

    /// Number of ready entries.
    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every ready entry. In-flight fetches are left to complete.
    pub fn clear(&self) {
        let mut inner = self.lock();
        let ready: Vec<CacheKey> = inner.order.drain(..).collect();
        for key in ready {
            inner.slots.remove(&key);
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            coalesced: self.counters.coalesced.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }
}
