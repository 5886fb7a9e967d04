//! Shared test fixtures
//!
//! An in-process stand-in for the realtime database REST API.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use memocache::{CacheConfig, Database, Memoizer};
use serde_json::{json, Map, Value};
use tokio::task::JoinHandle;

#[derive(Clone)]
struct MockState {
    tree: Arc<Mutex<Value>>,
    reads: Arc<AtomicUsize>,
    next_id: Arc<AtomicUsize>,
    auth: Option<String>,
    get_delay: Duration,
}

/// Running mock database; the server stops when this is dropped.
pub struct MockFirebase {
    pub url: String,
    pub tree: Arc<Mutex<Value>>,
    reads: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl MockFirebase {
    /// Number of GET requests served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Value {
        self.tree.lock().unwrap().clone()
    }
}

impl Drop for MockFirebase {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn_mock_firebase(initial: Value) -> MockFirebase {
    spawn_mock_firebase_with_auth(initial, None).await
}

pub async fn spawn_mock_firebase_with_auth(initial: Value, auth: Option<&str>) -> MockFirebase {
    spawn(initial, auth, Duration::ZERO).await
}

/// Mock whose GET responses are held back for `delay` after the data was
/// read, so writes can complete while a read is in flight.
pub async fn spawn_mock_firebase_with_get_delay(initial: Value, delay: Duration) -> MockFirebase {
    spawn(initial, None, delay).await
}

async fn spawn(initial: Value, auth: Option<&str>, get_delay: Duration) -> MockFirebase {
    let state = MockState {
        tree: Arc::new(Mutex::new(initial)),
        reads: Arc::new(AtomicUsize::new(0)),
        next_id: Arc::new(AtomicUsize::new(0)),
        auth: auth.map(str::to_string),
        get_delay,
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let app = Router::new().fallback(handle).with_state(state.clone());
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockFirebase {
        url,
        tree: state.tree,
        reads: state.reads,
        handle,
    }
}

/// Database client against `mock` with its own cache.
pub fn database(mock: &MockFirebase, config: &CacheConfig) -> Database {
    let memo = Memoizer::new(config).unwrap();
    Database::new(mock.url.clone(), Arc::new(tokio::sync::Mutex::new(memo)))
}

/// Sample data resembling the bot's database.
pub fn sample_tree() -> Value {
    json!({
        "bot_settings": {"prefix": "!", "greeting_on": false},
        "twitch_users": {
            "-Nalice": {"user": "alice", "id": "1001"},
            "-Nbob": {"user": "bob", "id": "1002"}
        }
    })
}

async fn handle(State(state): State<MockState>, method: Method, uri: Uri, body: Bytes) -> Response {
    if let Some(token) = &state.auth {
        let expected = format!("auth={}", token);
        let authorized = uri
            .query()
            .is_some_and(|q| q.split('&').any(|pair| pair == expected));
        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Permission denied"})),
            )
                .into_response();
        }
    }

    let Some(path) = uri.path().strip_suffix(".json") else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let response = apply(&state, &method, &segments, &body);
    if method == Method::GET && !state.get_delay.is_zero() {
        tokio::time::sleep(state.get_delay).await;
    }
    response
}

fn apply(state: &MockState, method: &Method, segments: &[&str], body: &[u8]) -> Response {
    let mut tree = state.tree.lock().unwrap();

    match *method {
        Method::GET => {
            state.reads.fetch_add(1, Ordering::SeqCst);
            let data = node_at(&tree, segments).cloned().unwrap_or(Value::Null);
            Json(data).into_response()
        }
        Method::POST => {
            let Ok(data) = serde_json::from_slice::<Value>(body) else {
                return StatusCode::BAD_REQUEST.into_response();
            };
            let name = format!("-N{:04}", state.next_id.fetch_add(1, Ordering::SeqCst));
            let parent = node_or_insert(&mut tree, segments);
            if let Some(children) = parent.as_object_mut() {
                children.insert(name.clone(), data);
            }
            Json(json!({ "name": name })).into_response()
        }
        Method::PATCH => {
            let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) else {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "Invalid data; couldn't parse JSON object"})),
                )
                    .into_response();
            };
            let node = node_or_insert(&mut tree, segments);
            if let Some(existing) = node.as_object_mut() {
                for (key, value) in fields.clone() {
                    existing.insert(key, value);
                }
            }
            Json(Value::Object(fields)).into_response()
        }
        Method::DELETE => {
            if let Some((last, parent)) = segments.split_last() {
                if let Some(Value::Object(children)) = node_at_mut(&mut tree, parent) {
                    children.remove(*last);
                }
            }
            Json(Value::Null).into_response()
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

fn node_at<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut node = root;
    for segment in segments {
        node = node.get(*segment)?;
    }
    Some(node)
}

fn node_at_mut<'a>(root: &'a mut Value, segments: &[&str]) -> Option<&'a mut Value> {
    let mut node = root;
    for segment in segments {
        node = node.get_mut(*segment)?;
    }
    Some(node)
}

fn node_or_insert<'a>(root: &'a mut Value, segments: &[&str]) -> &'a mut Value {
    let mut node = root;
    for segment in segments {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = match node {
            Value::Object(children) => children
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => unreachable!("node was just made an object"),
        };
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    node
}
