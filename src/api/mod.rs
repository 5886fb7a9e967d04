//! API Module
//!
//! HTTP handlers and routing for the caching database service.
//!
//! # Endpoints
//! - `GET|POST|PATCH|DELETE /db/*path` - Realtime database access
//! - `GET /cache/keys` - List cached paths
//! - `DELETE /cache` - Drop all cached reads
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
