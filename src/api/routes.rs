//! API Routes
//!
//! Configures the Axum router with all service endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_cache_handler, delete_handler, health_handler, keys_handler, push_handler,
    read_handler, stats_handler, update_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /db/*path` - Read data (memoized)
/// - `POST /db/*path` - Push a child (`?unique=true` rejects duplicates)
/// - `PATCH /db/*path` - Merge-update data
/// - `DELETE /db/*path` - Delete data
/// - `GET /cache/keys` - List cached paths
/// - `DELETE /cache` - Drop all cached reads
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/db/*path",
            get(read_handler)
                .post(push_handler)
                .patch(update_handler)
                .delete(delete_handler),
        )
        .route("/cache", delete(clear_cache_handler))
        .route("/cache/keys", get(keys_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
