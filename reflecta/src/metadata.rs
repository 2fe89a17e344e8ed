use alloc::collections::BTreeMap;

use crate::{SharedValue, UValue};

/// Named values attached to an entity at registration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata(BTreeMap<String, SharedValue>);

impl Metadata {
    /// No entries.
    pub const fn new() -> Self {
        Metadata(BTreeMap::new())
    }

    /// Adds an entry, replacing any entry with the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: SharedValue) {
        self.0.insert(key.into(), value);
    }

    /// Builder form of [`Self::insert`].
    pub fn with(mut self, key: impl Into<String>, value: SharedValue) -> Self {
        self.insert(key, value);
        self
    }

    /// The value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&UValue> {
        self.0.get(key).map(SharedValue::get)
    }

    /// Returns `true` if an entry is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Entries, ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.get()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An empty map, returned for empty handles.
pub(crate) static EMPTY_METADATA: Metadata = Metadata::new();
