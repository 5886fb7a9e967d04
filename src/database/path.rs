//! Database path helpers
//!
//! Paths are `/`-separated; the root is the empty path.

use crate::error::{CacheError, Result};

/// Characters the realtime database refuses in a key.
const FORBIDDEN: &[char] = &['.', '$', '#', '[', ']'];

/// Strips leading/trailing slashes and empty segments.
pub fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalizes `path` and rejects segments the database would refuse.
pub fn validate(path: &str) -> Result<String> {
    let normalized = normalize(path);
    for segment in normalized.split('/').filter(|s| !s.is_empty()) {
        validate_key(segment)?;
    }
    Ok(normalized)
}

/// Checks a single child key.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.contains('/') || key.contains(FORBIDDEN) {
        return Err(CacheError::InvalidRequest(format!(
            "Key '{}' contains a forbidden character",
            key
        )));
    }
    Ok(())
}

/// Appends `child` to `parent`.
pub fn join(parent: &str, child: &str) -> String {
    match (normalize(parent), normalize(child)) {
        (p, c) if p.is_empty() => c,
        (p, c) if c.is_empty() => p,
        (p, c) => format!("{}/{}", p, c),
    }
}

/// Splits off the last segment: `a/b/c` -> (`a/b`, `c`).
pub fn split_last(path: &str) -> Option<(String, String)> {
    let normalized = normalize(path);
    if normalized.is_empty() {
        return None;
    }
    match normalized.rsplit_once('/') {
        Some((parent, last)) => Some((parent.to_string(), last.to_string())),
        None => Some((String::new(), normalized)),
    }
}

/// True when `ancestor` is `path` itself or one of its ancestors.
pub fn contains(ancestor: &str, path: &str) -> bool {
    ancestor.is_empty()
        || path == ancestor
        || (path.starts_with(ancestor) && path[ancestor.len()..].starts_with('/'))
}

/// True when a write at one path can change what a read at the other returns.
pub fn overlaps(a: &str, b: &str) -> bool {
    contains(a, b) || contains(b, a)
}
