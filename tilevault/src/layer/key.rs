//! Storage keys for cached tiles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Key under which a tile image is persisted.
///
/// A key is the tile's remote URL rendered with the *first* configured
/// subdomain, so one geographic tile has one key no matter which subdomain
/// served it. Keys depend only on the template, the coordinate and the
/// subdomain list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    pub(crate) fn new(canonical_url: String) -> Self {
        Self(canonical_url)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<StorageKey> for String {
    fn from(key: StorageKey) -> Self {
        key.0
    }
}
