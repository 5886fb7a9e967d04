//! Cache Store Module
//!
//! Bounded key-value storage combining HashMap lookup with FIFO ordering and
//! TTL-based purging.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, debug_span, trace, Span};

use crate::cache::{CacheEntry, CacheStats, Clock, FifoTracker, MonotonicClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == TTL Cache ==
/// Bounded, expiring key-value store.
///
/// `get` is a raw lookup and never checks freshness; callers that care about
/// staleness compare the entry age against [`TtlCache::ttl`] themselves (see
/// [`crate::memo::Memoizer`]). Stale entries are purged from the front of the
/// insertion order on every [`TtlCache::add`] and by [`TtlCache::expire`].
#[derive(Debug)]
pub struct TtlCache<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// Insertion order tracker
    order: FifoTracker<K>,
    /// Eviction and expiration counters
    stats: CacheStats,
    /// Maximum number of live entries
    max_size: usize,
    /// Freshness window
    ttl: Duration,
    clock: Arc<dyn Clock>,
    span: Span,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    // == Constructor ==
    /// Creates a cache holding at most `max_size` entries, each fresh for `ttl`.
    ///
    /// Fails with [`CacheError::InvalidConfig`] when `max_size` is zero.
    pub fn new(max_size: usize, ttl: Duration) -> Result<Self> {
        if max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            entries: HashMap::new(),
            order: FifoTracker::new(),
            stats: CacheStats::new(),
            max_size,
            ttl,
            clock: Arc::new(MonotonicClock),
            span: debug_span!("ttl_cache", max_size, ttl_ms = ttl.as_millis() as u64),
        })
    }

    /// Creates a cache from construction-time options.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(config.max_size, config.ttl)
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the span every log event of this cache is emitted in.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    // == Add ==
    /// Inserts or overwrites `key` stamped with the current time.
    ///
    /// An overwrite counts as a new insertion and moves the key to the back of
    /// the eviction order. Stale entries are purged first; if the bound is
    /// still exceeded afterwards, the oldest-inserted entry is evicted whether
    /// or not it is expired.
    pub fn add(&mut self, key: K, value: V) {
        let span = self.span.clone();
        let _guard = span.enter();

        let now = self.clock.now();
        self.purge_expired(now);

        if let Some(previous) = self.entries.remove(&key) {
            self.order.remove(previous.seq);
        }

        let seq = self.order.push(key.clone());
        debug!(?key, seq, "Adding entry to cache");
        self.entries.insert(key, CacheEntry::new(value, now, seq));

        while self.entries.len() > self.max_size {
            if !self.evict_oldest() {
                break;
            }
        }

        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the stored value, fresh or not.
    ///
    /// `None` means the key is unknown; a cached `None` comes back as
    /// `Some(&None)`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        self.get_entry(key).map(|entry| &entry.value)
    }

    /// Returns the stored entry with its insertion metadata.
    pub fn get_entry<Q>(&self, key: &Q) -> Option<&CacheEntry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        let entry = self.entries.get(key);
        self.span.in_scope(|| trace!(?key, found = entry.is_some(), "Cache lookup"));
        entry
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    // == Delete ==
    /// Removes `key` and returns its value. Unknown keys are a no-op.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = self.entries.remove(key)?;
        self.order.remove(entry.seq);
        self.stats.set_total_entries(self.entries.len());
        Some(entry.value)
    }

    // == Retain ==
    /// Keeps only the entries for which `keep` returns true.
    ///
    /// Returns the number of entries removed.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&K, &V) -> bool,
    {
        let doomed: Vec<(u64, K)> = self
            .entries
            .iter()
            .filter(|(key, entry)| !keep(key, &entry.value))
            .map(|(key, entry)| (entry.seq, key.clone()))
            .collect();

        for (seq, key) in &doomed {
            self.entries.remove(key);
            self.order.remove(*seq);
        }

        self.stats.set_total_entries(self.entries.len());
        doomed.len()
    }

    // == Expire ==
    /// Removes every stale entry.
    ///
    /// Returns the number of entries removed.
    pub fn expire(&mut self) -> usize {
        let span = self.span.clone();
        let _guard = span.enter();

        let now = self.clock.now();
        let removed = self.purge_expired(now);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Clear ==
    /// Drops all entries. Returns how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.order.clear();
        self.stats.set_total_entries(0);
        count
    }

    // == Introspection ==
    /// Keys from oldest to newest insertion.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.order.iter()
    }

    /// Values in the same order as [`TtlCache::keys`].
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Key-value pairs from oldest to newest insertion.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).map(|entry| (key, &entry.value)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current time according to this cache's clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Returns current eviction/expiration statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    // == Internals ==
    /// Pops stale entries off the front of the insertion order.
    ///
    /// Insertion timestamps never decrease along the order, so the first fresh
    /// entry ends the scan.
    fn purge_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0;

        while let Some((seq, key)) = self.order.peek_oldest() {
            let expired = match self.entries.get(key) {
                Some(entry) => entry.is_expired(now, self.ttl),
                None => true,
            };
            if !expired {
                break;
            }

            if let Some(key) = self.order.remove(seq) {
                if self.entries.remove(&key).is_some() {
                    debug!(?key, "Expired entry purged");
                    removed += 1;
                }
            }
        }

        self.stats.record_expirations(removed);
        removed
    }

    fn evict_oldest(&mut self) -> bool {
        match self.order.pop_oldest() {
            Some((_, key)) => {
                self.entries.remove(&key);
                self.stats.record_eviction();
                debug!(?key, max_size = self.max_size, "Evicted oldest entry");
                true
            }
            None => false,
        }
    }
}
