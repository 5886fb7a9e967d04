//! Memoization Module
//!
//! Derives cache keys from call arguments and serves repeated calls from a
//! [`crate::cache::TtlCache`] while the cached result is fresh.

mod key;
mod memoize;
mod serializer;

use std::sync::Arc;

use tokio::sync::Mutex;

pub use key::{CacheKey, KeyPart};
pub use memoize::{memoize, try_memoize, Memoized, Memoizer, Stamped};

/// Memoizer shared between tasks; one lock guards the whole cache so that
/// lookups, inserts and evictions happen as a unit.
pub type SharedMemoizer<R> = Arc<Mutex<Memoizer<R>>>;
