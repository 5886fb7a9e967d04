//! Cache Module
//!
//! Provides bounded in-memory storage with TTL purging and FIFO eviction.

mod clock;
mod entry;
mod fifo;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use entry::CacheEntry;
pub use fifo::FifoTracker;
pub use stats::CacheStats;
pub use store::TtlCache;

// == Public Constants ==
/// Default maximum number of live entries
pub const DEFAULT_MAX_SIZE: usize = 100;

/// Default freshness window in seconds
pub const DEFAULT_TTL_SECS: u64 = 300;
