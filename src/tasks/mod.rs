//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - TTL Purge: Removes stale cached results at configured intervals

mod purge;

pub use purge::spawn_purge_task;
