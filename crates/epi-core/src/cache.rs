//! `TickCache` — per-tick memoization of expensive readers.
//!
//! # Why this exists
//!
//! Several models need the same derived quantity in one tick (the pairwise
//! distance matrix is read by both the contact detector and the pathogen).
//! `TickCache` computes it once per tick and hands out shared `Arc`s.
//!
//! # Invalidation rules
//!
//! - Entries belong to exactly one tick.  [`TickCache::set_time`] with a new
//!   tick drops every entry from the previous one.
//! - [`TickCache::invalidate`] drops the current tick's entries.  There is no
//!   dependency tracking: any code that mutates an input of a cached reader
//!   (chiefly agent positions) must call it before the next read.
//!
//! The cache is owned by the scheduler, one per population, and lent to
//! models through the step context.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::Tick;

/// Identity of a cached reader.  Use one `const` per reader function.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct CacheKey(pub &'static str);

type Entry = Arc<dyn Any + Send + Sync>;

/// Memo table keyed by `(current tick, reader identity)`.
#[derive(Default)]
pub struct TickCache {
    time: Tick,
    entries: HashMap<CacheKey, Entry>,
    hits: u64,
    misses: u64,
}

impl TickCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tick the current entries belong to.
    pub fn time(&self) -> Tick {
        self.time
    }

    /// Move the cache to `now`.  Entries of any other tick become unreachable
    /// and are purged.
    pub fn set_time(&mut self, now: Tick) {
        if now != self.time {
            self.entries.clear();
            self.time = now;
        }
    }

    /// Drop every entry of the current tick.
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    /// Memoized value for `key`, if one was computed this tick.
    pub fn get<T: Any + Send + Sync>(&self, key: CacheKey) -> Option<Arc<T>> {
        self.entries
            .get(&key)
            .cloned()
            .and_then(|entry| entry.downcast::<T>().ok())
    }

    /// Return the memoized value for `key`, computing it with `f` on a miss.
    pub fn get_or_insert_with<T, F>(&mut self, key: CacheKey, f: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        match self.get_or_try_insert_with::<T, std::convert::Infallible, _>(key, || Ok(f())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible variant of [`get_or_insert_with`](Self::get_or_insert_with).
    /// A failed computation leaves the cache untouched.
    pub fn get_or_try_insert_with<T, E, F>(&mut self, key: CacheKey, f: F) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(hit) = self.get::<T>(key) {
            self.hits += 1;
            return Ok(hit);
        }
        self.misses += 1;
        let value = Arc::new(f()?);
        self.entries.insert(key, value.clone() as Entry);
        Ok(value)
    }

    /// Number of readers memoized for the current tick.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
