//! Namespaced resource keys.
//!
//! Keys name boss bars, command storages, predicates, blocks and entity types
//! (e.g. `minecraft:stone`). Ordering is lexical by `(namespace, path)` so maps
//! keyed by them iterate deterministically.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Namespace used when a key omits an explicit one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Error returned when parsing an invalid [`ResourceKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceKeyError {
    /// Input was empty after trimming.
    #[error("resource key cannot be empty")]
    Empty,
    /// Namespace contained characters outside `a-z0-9_.-`.
    #[error("invalid character in namespace of '{0}'")]
    InvalidNamespace(String),
    /// Path contained characters outside `a-z0-9_./-`.
    #[error("invalid character in path of '{0}'")]
    InvalidPath(String),
}

/// A namespaced key of the form `namespace:path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceKey {
    namespace: String,
    path: String,
}

impl ResourceKey {
    /// Parse `namespace:path` or a bare `path` in [`DEFAULT_NAMESPACE`].
    pub fn parse(input: &str) -> Result<Self, ResourceKeyError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ResourceKeyError::Empty);
        }
        let (namespace, path) = input.split_once(':').unwrap_or((DEFAULT_NAMESPACE, input));
        if namespace.is_empty() || !namespace.chars().all(is_namespace_char) {
            return Err(ResourceKeyError::InvalidNamespace(input.to_string()));
        }
        if path.is_empty() || !path.chars().all(|c| is_namespace_char(c) || c == '/') {
            return Err(ResourceKeyError::InvalidPath(input.to_string()));
        }
        Ok(Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        })
    }

    /// Key in the default namespace. `path` must already be valid.
    pub fn minecraft(path: &str) -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            path: path.to_string(),
        }
    }

    /// Key namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Key path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Characters allowed anywhere in a resource key.
pub fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.')
}

/// Characters that may appear in an unparsed key token.
pub fn is_key_char(c: char) -> bool {
    is_namespace_char(c) || c == ':' || c == '/'
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for ResourceKey {
    type Err = ResourceKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceKey {
    type Error = ResourceKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceKey> for String {
    fn from(key: ResourceKey) -> Self {
        key.to_string()
    }
}
