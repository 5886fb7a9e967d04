//! Realtime Database Client
//!
//! Thin REST adapter for a Firebase-style realtime database with reads
//! memoized through a shared [`Memoizer`].

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::Config;
use crate::database::path;
use crate::error::{CacheError, Result};
use crate::memo::{CacheKey, KeyPart, Memoizer, SharedMemoizer};

/// Function identity under which reads are cached.
const READ: &str = "read";

#[derive(Debug, Deserialize)]
struct PushReply {
    name: String,
}

// == Database ==
/// Realtime database client.
///
/// Cheap to clone; clones share the HTTP connection pool and the read cache.
#[derive(Debug, Clone)]
pub struct Database {
    http: reqwest::Client,
    base_url: String,
    auth: Option<String>,
    cache: SharedMemoizer<Value>,
}

impl Database {
    /// Creates a client for the database rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, cache: SharedMemoizer<Value>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth: None,
            cache,
        }
    }

    /// Creates a client and its read cache from service configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let memo = Memoizer::new(&config.cache)?;
        let db = Self::new(config.database_url.clone(), Arc::new(Mutex::new(memo)));
        Ok(match &config.database_auth {
            Some(token) => db.with_auth(token.clone()),
            None => db,
        })
    }

    /// Sends `auth=<token>` with every request.
    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(token.into());
        self
    }

    pub fn cache(&self) -> &SharedMemoizer<Value> {
        &self.cache
    }

    // == Read ==
    /// Returns the data at `path`, `null` if there is none.
    ///
    /// Served from the cache while fresh. Failed reads are not cached, nor are
    /// reads that overlapped an invalidating write.
    pub async fn read(&self, path: &str) -> Result<Value> {
        let path = path::validate(path)?;
        let key = CacheKey::new(READ).arg(&path)?;

        let seen = {
            let mut memo = self.cache.lock().await;
            if let Some(data) = memo.lookup(&key) {
                return Ok(data);
            }
            memo.generation()
        };

        debug!(%path, "Reading data from database");
        let response = self.send(self.request(Method::GET, &path)).await?;
        let data: Value = response.json().await?;

        // A write that finished while the request was in flight wins
        self.cache
            .lock()
            .await
            .store_if_unchanged(key, data.clone(), seen);
        Ok(data)
    }

    // == Add ==
    /// Pushes `data` as a new child of `path` and returns the generated key.
    pub async fn add(&self, path: &str, data: &Value) -> Result<String> {
        let path = path::validate(path)?;
        debug!(%path, %data, "Adding data to database");

        let response = self
            .send(self.request(Method::POST, &path).json(data))
            .await?;
        let reply: PushReply = response.json().await?;

        self.invalidate(&path).await;
        info!(%path, name = %reply.name, "Added child");
        Ok(reply.name)
    }

    // == Update ==
    /// Merges the fields of `data` into the object at `path`.
    pub async fn update(&self, path: &str, data: &Value) -> Result<()> {
        let path = path::validate(path)?;
        if !data.is_object() {
            return Err(CacheError::InvalidRequest(
                "Update data must be a JSON object".to_string(),
            ));
        }
        debug!(%path, %data, "Updating data in database");

        self.send(self.request(Method::PATCH, &path).json(data))
            .await?;

        self.invalidate(&path).await;
        Ok(())
    }

    // == Delete ==
    /// Removes child `key` of `path`. Removing a missing child succeeds.
    pub async fn delete(&self, path: &str, key: &str) -> Result<()> {
        path::validate_key(key)?;
        let target = path::join(&path::validate(path)?, key);
        debug!(path = %target, "Deleting data from database");

        self.send(self.request(Method::DELETE, &target)).await?;

        self.invalidate(&target).await;
        Ok(())
    }

    // == Push Unique ==
    /// Pushes `data` under `path` unless an equal child already exists.
    ///
    /// Returns the new key, or `None` when a duplicate was found.
    pub async fn push_unique(&self, path: &str, data: &Value) -> Result<Option<String>> {
        let existing = self.read(path).await?;
        if let Some((key, _)) = find_entry(&existing, data) {
            debug!(path, %key, "Equal child already present");
            return Ok(None);
        }
        self.add(path, data).await.map(Some)
    }

    /// Database paths currently cached, oldest first.
    pub async fn cached_paths(&self) -> Vec<String> {
        let memo = self.cache.lock().await;
        let paths = memo
            .cache()
            .keys()
            .filter_map(|key| read_path(key).map(str::to_string))
            .collect();
        paths
    }

    // == Internals ==
    async fn invalidate(&self, written: &str) {
        let removed = self
            .cache
            .lock()
            .await
            .retain(|key, _| !read_path(key).is_some_and(|cached| path::overlaps(cached, written)));
        if removed > 0 {
            debug!(path = written, removed, "Invalidated cached reads");
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}.json", self.base_url, path);
        let builder = self.http.request(method, url);
        match &self.auth {
            Some(token) => builder.query(&[("auth", token)]),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
        Err(CacheError::Upstream {
            status: status.as_u16(),
            message,
        })
    }
}

/// Path of a cached read, if `key` belongs to one.
fn read_path(key: &CacheKey) -> Option<&str> {
    if key.function() != READ {
        return None;
    }
    match key.positional() {
        [KeyPart::Str(path)] => Some(path.as_str()),
        _ => None,
    }
}

/// Returns the first child of `data` equal to `target`, with its key.
///
/// Children of an object are searched by key; children of an array by index.
pub fn find_entry(data: &Value, target: &Value) -> Option<(String, Value)> {
    match data {
        Value::Object(children) => children
            .iter()
            .find(|(_, child)| *child == target)
            .map(|(key, child)| (key.clone(), child.clone())),
        Value::Array(children) => children
            .iter()
            .position(|child| child == target)
            .map(|index| (index.to_string(), children[index].clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use serde_json::json;

    #[test]
    fn test_find_entry_in_object() {
        let data = json!({
            "-Nabc": {"user": "alice", "id": 1},
            "-Nabd": {"user": "bob", "id": 2},
        });

        let found = find_entry(&data, &json!({"user": "bob", "id": 2}));

        assert_eq!(found, Some(("-Nabd".to_string(), json!({"user": "bob", "id": 2}))));
    }

    #[test]
    fn test_find_entry_in_array() {
        let data = json!(["a", "b", "c"]);

        assert_eq!(find_entry(&data, &json!("c")), Some(("2".to_string(), json!("c"))));
    }

    #[test]
    fn test_find_entry_missing() {
        assert_eq!(find_entry(&json!({"a": 1}), &json!(2)), None);
        assert_eq!(find_entry(&Value::Null, &json!(2)), None);
    }

    #[test]
    fn test_read_path() {
        let read = CacheKey::new(READ).arg("users").unwrap();
        let other = CacheKey::new("list").arg("users").unwrap();

        assert_eq!(read_path(&read), Some("users"));
        assert_eq!(read_path(&other), None);
    }

    #[test]
    fn test_from_config_applies_auth() {
        let config = Config {
            cache: CacheConfig::new(5, std::time::Duration::from_secs(1)),
            database_auth: Some("secret".to_string()),
            ..Config::default()
        };

        let db = Database::from_config(&config).unwrap();

        assert_eq!(db.auth.as_deref(), Some("secret"));
        assert_eq!(db.base_url, "http://127.0.0.1:9000");
    }

    #[tokio::test]
    async fn test_invalid_path_fails_before_request() {
        let config = Config {
            database_url: "http://127.0.0.1:1".to_string(),
            ..Config::default()
        };
        let db = Database::from_config(&config).unwrap();

        let result = db.read("users/a.b").await;

        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
        assert!(db.cache().lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_requires_object() {
        let db = Database::from_config(&Config::default()).unwrap();

        let result = db.update("bot_settings", &json!(5)).await;

        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }
}
