//! Response DTOs for the service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;

/// Response body for a database read (GET /db/*path)
#[derive(Debug, Clone, Serialize)]
pub struct ReadResponse {
    /// Normalized database path
    pub path: String,
    /// Data stored at the path, `null` if none
    pub data: Value,
}

impl ReadResponse {
    pub fn new(path: impl Into<String>, data: Value) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }
}

/// Response body for a push (POST /db/*path)
#[derive(Debug, Clone, Serialize)]
pub struct PushResponse {
    /// Parent path the child was pushed under
    pub path: String,
    /// Generated child key
    pub name: String,
}

impl PushResponse {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

/// Response body for a merge update (PATCH /db/*path)
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResponse {
    /// Success message
    pub message: String,
    /// The path that was updated
    pub path: String,
}

impl UpdateResponse {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            message: format!("Path '{}' updated successfully", path),
            path,
        }
    }
}

/// Response body for a delete (DELETE /db/*path)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The path that was deleted
    pub path: String,
}

impl DeleteResponse {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            message: format!("Path '{}' deleted successfully", path),
            path,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of reads served from the cache
    pub hits: u64,
    /// Number of reads that went to the database
    pub misses: u64,
    /// Number of entries evicted by the size bound
    pub evictions: u64,
    /// Number of entries dropped for being stale
    pub expirations: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Configured size bound
    pub max_size: usize,
    /// Configured freshness window in seconds
    pub ttl_secs: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics and options
    pub fn new(stats: &CacheStats, max_size: usize, ttl_secs: f64) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
            max_size,
            ttl_secs,
        }
    }
}

/// Response body for cache introspection (GET /cache/keys)
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    /// Cached database paths, oldest first
    pub keys: Vec<String>,
}

/// Response body for clearing the cache (DELETE /cache)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Number of cached entries dropped
    pub removed: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
