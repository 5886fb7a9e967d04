//! Database Module
//!
//! Realtime key-value database adapter whose reads go through the memoizing
//! cache.

mod client;
pub mod path;

pub use client::{find_entry, Database};
