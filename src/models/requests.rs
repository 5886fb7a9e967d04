//! Request DTOs for the service API
//!
//! Defines the query parameters accepted by the database endpoints.

use serde::Deserialize;

/// Query parameters of the push operation (POST /db/*path)
///
/// # Fields
/// - `unique`: Only push if no equal child exists under the path
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushParams {
    #[serde(default)]
    pub unique: bool,
}
