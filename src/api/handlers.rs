//! API Handlers
//!
//! HTTP request handlers for each service endpoint.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::config::Config;
use crate::database::{path, Database};
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, HealthResponse, KeysResponse, PushParams, PushResponse,
    ReadResponse, StatsResponse, UpdateResponse,
};

/// Application state shared across all handlers.
///
/// The database client carries the shared read cache.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates the database client and its cache from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(Database::from_config(config)?))
    }
}

/// Handler for GET /db/*path
///
/// Returns the data at the path, served from the cache while fresh.
pub async fn read_handler(
    State(state): State<AppState>,
    Path(db_path): Path<String>,
) -> Result<Json<ReadResponse>> {
    let data = state.db.read(&db_path).await?;
    let db_path = path::normalize(&db_path);

    if data.is_null() {
        return Err(CacheError::NotFound(db_path));
    }
    Ok(Json(ReadResponse::new(db_path, data)))
}

/// Handler for POST /db/*path
///
/// Pushes the body as a new child. With `?unique=true` an equal existing
/// child makes the request fail with 409.
pub async fn push_handler(
    State(state): State<AppState>,
    Path(db_path): Path<String>,
    Query(params): Query<PushParams>,
    Json(data): Json<Value>,
) -> Result<Json<PushResponse>> {
    let name = if params.unique {
        state
            .db
            .push_unique(&db_path, &data)
            .await?
            .ok_or_else(|| {
                CacheError::Conflict(format!("An equal child already exists under '{}'", db_path))
            })?
    } else {
        state.db.add(&db_path, &data).await?
    };

    Ok(Json(PushResponse::new(path::normalize(&db_path), name)))
}

/// Handler for PATCH /db/*path
///
/// Merges the body object into the data at the path.
pub async fn update_handler(
    State(state): State<AppState>,
    Path(db_path): Path<String>,
    Json(data): Json<Value>,
) -> Result<Json<UpdateResponse>> {
    state.db.update(&db_path, &data).await?;

    Ok(Json(UpdateResponse::new(path::normalize(&db_path))))
}

/// Handler for DELETE /db/*path
///
/// Removes the last path segment from its parent.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(db_path): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let (parent, key) = path::split_last(&db_path)
        .ok_or_else(|| CacheError::InvalidRequest("Refusing to delete the root".to_string()))?;
    state.db.delete(&parent, &key).await?;

    Ok(Json(DeleteResponse::new(path::join(&parent, &key))))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let memo = state.db.cache().lock().await;
    let cache = memo.cache();

    Json(StatsResponse::new(
        &memo.stats(),
        cache.max_size(),
        cache.ttl().as_secs_f64(),
    ))
}

/// Handler for GET /cache/keys
///
/// Lists cached database paths in insertion order.
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    Json(KeysResponse {
        keys: state.db.cached_paths().await,
    })
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.db.cache().lock().await.clear();
    Json(ClearResponse { removed })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use std::time::Duration;

    fn offline_state() -> AppState {
        let config = Config {
            cache: CacheConfig::new(10, Duration::from_secs(300)),
            database_url: "http://127.0.0.1:1".to_string(),
            ..Config::default()
        };
        AppState::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_stats_handler_reports_options() {
        let response = stats_handler(State(offline_state())).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
        assert_eq!(response.max_size, 10);
        assert_eq!(response.ttl_secs, 300.0);
    }

    #[tokio::test]
    async fn test_delete_root_rejected() {
        let result = delete_handler(State(offline_state()), Path("/".to_string())).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_read_invalid_path_rejected() {
        let result = read_handler(State(offline_state()), Path("users/a#b".to_string())).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_unreachable_database_is_bad_gateway() {
        let result = read_handler(State(offline_state()), Path("users".to_string())).await;
        assert!(matches!(result, Err(CacheError::Database(_))));
    }

    #[tokio::test]
    async fn test_clear_empty_cache() {
        let response = clear_cache_handler(State(offline_state())).await;
        assert_eq!(response.removed, 0);
    }
}
