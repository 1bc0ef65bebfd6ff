//! Navigation locations: a path plus an optional query string.

use serde::{Deserialize, Serialize};

/// A view location, e.g. `/rules?page=2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    query: Option<String>,
}

impl Location {
    /// Parse a location from a full path. Never fails: an empty input is
    /// the root, a missing leading slash is added, trailing slashes are
    /// removed, and any fragment is dropped.
    pub fn parse(full_path: &str) -> Self {
        let without_fragment = full_path.split('#').next().unwrap_or_default().trim();
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (without_fragment, None),
        };

        let path = format!("/{}", path.trim_matches('/'));

        Self {
            path,
            query: query.filter(|q| !q.is_empty()).map(String::from),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path and query as a single string.
    pub fn full_path(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.query {
            Some(query) => write!(f, "{}?{}", self.path, query),
            None => write!(f, "{}", self.path),
        }
    }
}

impl From<&str> for Location {
    fn from(full_path: &str) -> Self {
        Location::parse(full_path)
    }
}
