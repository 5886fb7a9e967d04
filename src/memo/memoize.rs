//! Memoization Module
//!
//! Result caching in front of arbitrary functions, keyed by call arguments and
//! bounded by a [`TtlCache`].

use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, debug_span, Span};

use crate::cache::{CacheStats, Clock, TtlCache};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::memo::CacheKey;

// == Stamped ==
/// A memoized result and the moment it was cached.
#[derive(Debug, Clone)]
pub struct Stamped<R> {
    pub value: R,
    pub cached_at: Instant,
}

// == Memoizer ==
/// Freshness-checking front of a [`TtlCache`].
///
/// The memoizer stamps every result itself when storing it and compares that
/// stamp against the TTL on lookup; the underlying storage never decides
/// freshness on reads.
#[derive(Debug)]
pub struct Memoizer<R> {
    cache: TtlCache<CacheKey, Stamped<R>>,
    /// Bumped by every invalidating operation
    generation: u64,
}

impl<R: Clone> Memoizer<R> {
    /// Creates a memoizer from construction-time options.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let cache = TtlCache::from_config(config)?.with_span(debug_span!(
            "memoizer",
            max_size = config.max_size,
            ttl_ms = config.ttl.as_millis() as u64
        ));
        Ok(Self {
            cache,
            generation: 0,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.cache = self.cache.with_clock(clock);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.cache = self.cache.with_span(span);
        self
    }

    // == Lookup ==
    /// Returns the cached result for `key` if it is younger than the TTL.
    ///
    /// A stale entry is dropped and reported as a miss.
    pub fn lookup(&mut self, key: &CacheKey) -> Option<R> {
        let span = self.cache.span().clone();
        let _guard = span.enter();

        let now = self.cache.now();
        let ttl = self.cache.ttl();

        let fresh = match self.cache.get(key) {
            Some(stamped) => {
                let age = now.saturating_duration_since(stamped.cached_at);
                if age < ttl {
                    debug!(%key, age_ms = age.as_millis() as u64, "Cache hit");
                    Some(stamped.value.clone())
                } else {
                    debug!(%key, age_ms = age.as_millis() as u64, "Cached result is stale");
                    None
                }
            }
            None => {
                debug!(%key, "Cache miss");
                None
            }
        };

        match fresh {
            Some(value) => {
                self.cache.stats_mut().record_hit();
                Some(value)
            }
            None => {
                if self.cache.delete(key).is_some() {
                    self.cache.stats_mut().record_expirations(1);
                }
                self.cache.stats_mut().record_miss();
                None
            }
        }
    }

    // == Store ==
    /// Caches `value` under `key`, stamped with the current time.
    pub fn store(&mut self, key: CacheKey, value: R) {
        let cached_at = self.cache.now();
        self.cache.add(key, Stamped { value, cached_at });
    }

    /// Returns the fresh cached result or computes, stores and returns a new one.
    pub fn get_or_insert_with<F>(&mut self, key: CacheKey, compute: F) -> R
    where
        F: FnOnce() -> R,
    {
        if let Some(value) = self.lookup(&key) {
            return value;
        }

        let value = compute();
        self.store(key, value.clone());
        value
    }

    /// Like [`Memoizer::get_or_insert_with`] for fallible computations.
    ///
    /// An error is returned as-is and nothing is cached.
    pub fn try_get_or_insert_with<E, F>(
        &mut self,
        key: CacheKey,
        compute: F,
    ) -> std::result::Result<R, E>
    where
        F: FnOnce() -> std::result::Result<R, E>,
    {
        if let Some(value) = self.lookup(&key) {
            return Ok(value);
        }

        let value = compute()?;
        self.store(key, value.clone());
        Ok(value)
    }

    /// Caches `value` only if nothing was invalidated since `seen` was taken
    /// from [`Memoizer::generation`]. Returns whether it was stored.
    ///
    /// Lets a caller that computes without holding the memoizer avoid caching
    /// a result an invalidation has already superseded.
    pub fn store_if_unchanged(&mut self, key: CacheKey, value: R, seen: u64) -> bool {
        if self.generation != seen {
            debug!(%key, "Result superseded by an invalidation, not cached");
            return false;
        }
        self.store(key, value);
        true
    }

    /// Counter advanced by `invalidate`, `retain` and `clear`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drops the cached result for `key`. Returns whether one existed.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.generation += 1;
        self.cache.delete(key).is_some()
    }

    /// Keeps only the results for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&CacheKey, &R) -> bool,
    {
        self.generation += 1;
        self.cache.retain(|key, stamped| keep(key, &stamped.value))
    }

    /// Removes every stale result.
    pub fn purge_expired(&mut self) -> usize {
        self.cache.expire()
    }

    pub fn clear(&mut self) -> usize {
        self.generation += 1;
        self.cache.clear()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Read access to the underlying storage for introspection.
    pub fn cache(&self) -> &TtlCache<CacheKey, Stamped<R>> {
        &self.cache
    }
}

// == Memoized ==
/// A function bundled with its own [`Memoizer`].
///
/// Build one with [`memoize`] for infallible functions or [`try_memoize`] for
/// functions returning `Result`; call it with [`Memoized::call`] or
/// [`Memoized::try_call`] respectively.
pub struct Memoized<A: ?Sized, R, F> {
    name: &'static str,
    func: F,
    memo: Memoizer<R>,
    _args: PhantomData<fn(&A)>,
}

/// Wraps an infallible function with a default-sized cache.
pub fn memoize<A, R, F>(func: F) -> Result<Memoized<A, R, F>>
where
    A: Serialize + ?Sized,
    R: Clone,
    F: FnMut(&A) -> R,
{
    Memoized::build(type_name::<F>(), &CacheConfig::default(), func)
}

/// Wraps a fallible function with a default-sized cache.
pub fn try_memoize<A, R, E, F>(func: F) -> Result<Memoized<A, R, F>>
where
    A: Serialize + ?Sized,
    R: Clone,
    F: FnMut(&A) -> std::result::Result<R, E>,
{
    Memoized::build(type_name::<F>(), &CacheConfig::default(), func)
}

impl<A, R, F> Memoized<A, R, F>
where
    A: Serialize + ?Sized,
    R: Clone,
{
    fn build(name: &'static str, config: &CacheConfig, func: F) -> Result<Self> {
        let memo = Memoizer::new(config)?.with_span(debug_span!("memoize", function = name));
        Ok(Self {
            name,
            func,
            memo,
            _args: PhantomData,
        })
    }

    /// Renames the function identity used in keys and logs.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self.memo = self.memo.with_span(debug_span!("memoize", function = name));
        self
    }

    /// Replaces the cache with one built from `config`, dropping cached results.
    pub fn with_config(mut self, config: &CacheConfig) -> Result<Self> {
        self.memo = Memoizer::new(config)?.with_span(debug_span!("memoize", function = self.name));
        Ok(self)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.memo = self.memo.with_clock(clock);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn memoizer(&self) -> &Memoizer<R> {
        &self.memo
    }

    pub fn memoizer_mut(&mut self) -> &mut Memoizer<R> {
        &mut self.memo
    }
}

impl<A, R, F> Memoized<A, R, F>
where
    A: Serialize + ?Sized,
    R: Clone,
    F: FnMut(&A) -> R,
{
    /// Returns the fresh cached result for `args` or calls the function.
    ///
    /// Fails only if `args` cannot be turned into a cache key, in which case
    /// the function is not called.
    pub fn call(&mut self, args: &A) -> Result<R> {
        let key = CacheKey::from_args(self.name, args)?;
        let func = &mut self.func;
        Ok(self.memo.get_or_insert_with(key, || func(args)))
    }
}

impl<A, R, E, F> Memoized<A, R, F>
where
    A: Serialize + ?Sized,
    R: Clone,
    E: From<CacheError>,
    F: FnMut(&A) -> std::result::Result<R, E>,
{
    /// Returns the fresh cached result for `args` or calls the function.
    ///
    /// Errors from the function are returned unchanged and never cached.
    pub fn try_call(&mut self, args: &A) -> std::result::Result<R, E> {
        let key = CacheKey::from_args(self.name, args)?;
        let func = &mut self.func;
        self.memo.try_get_or_insert_with(key, || func(args))
    }
}
