//! memocache - memoizing TTL cache in front of a realtime key-value database
//!
//! Provides a bounded, expiring key-value store with FIFO eviction, a
//! memoizer that serves repeated calls from it while results are fresh, and
//! a database adapter and HTTP service built on top.

pub mod api;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod memo;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::TtlCache;
pub use config::{CacheConfig, Config};
pub use database::Database;
pub use error::{CacheError, Result};
pub use memo::{memoize, try_memoize, CacheKey, Memoized, Memoizer};
pub use tasks::spawn_purge_task;
