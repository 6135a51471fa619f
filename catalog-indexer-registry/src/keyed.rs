//! Keyed registry with lazy loading and graceful registration.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info};

use crate::errors::RegistryError;
use crate::scope::RegistryScope;

/// Produces the value for a key on first access.
pub type Loader<V> = Box<dyn Fn(&str) -> Result<V, RegistryError> + Send + Sync>;

/// Called with every entry as it leaves the registry.
pub type ReleaseHook<V> = Box<dyn Fn(&str, &V) + Send + Sync>;

/// Identifier to value store that loads missing keys on demand.
///
/// The loader runs at most once per key for as long as the key stays in the
/// registry. Explicit registrations are append-only: registering an existing
/// key either fails or, when graceful, leaves the existing value in place.
///
/// The registry is owned by a single indexing operation and is not meant to
/// be shared between concurrent writers, hence the `&mut self` accessors.
/// Every entry is unregistered when the registry is reset or dropped, so a
/// release hook observes each value leaving exactly once.
pub struct KeyedRegistry<V> {
    entries: BTreeMap<String, V>,
    loader: Loader<V>,
    release_hook: Option<ReleaseHook<V>>,
}

impl<V> KeyedRegistry<V> {
    /// Create a registry backed by the given loader.
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn(&str) -> Result<V, RegistryError> + Send + Sync + 'static,
    {
        Self {
            entries: BTreeMap::new(),
            loader: Box::new(loader),
            release_hook: None,
        }
    }

    /// Create a registry that only serves explicitly registered keys.
    pub fn without_loader() -> Self {
        Self::new(|key| Err(RegistryError::not_registered(key)))
    }

    /// Install a hook that observes every entry as it is unregistered.
    pub fn with_release_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &V) + Send + Sync + 'static,
    {
        self.release_hook = Some(Box::new(hook));
        self
    }

    /// Return the value for `key`, loading and caching it on a miss.
    pub fn get(&mut self, key: &str) -> Result<&V, RegistryError> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let value = (self.loader)(key)?;
                debug!(key = %key, "Loaded registry entry");
                Ok(entry.insert(value))
            }
        }
    }

    /// Return the value for `key` without invoking the loader.
    pub fn lookup(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Insert `value` under `key`.
    ///
    /// When the key already exists the call fails with
    /// [`RegistryError::DuplicateKey`], unless `graceful` is set, in which
    /// case it is a no-op and the existing value is kept.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        value: V,
        graceful: bool,
    ) -> Result<(), RegistryError> {
        match self.entries.entry(key.into()) {
            Entry::Occupied(entry) => {
                if graceful {
                    debug!(key = %entry.key(), "Key already registered, keeping existing value");
                    Ok(())
                } else {
                    Err(RegistryError::duplicate(entry.key().clone()))
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(())
            }
        }
    }

    /// Whether `key` currently holds a value.
    pub fn is_registered(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove `key`, returning its value. Absent keys are ignored.
    pub fn unregister(&mut self, key: &str) -> Option<V> {
        let value = self.entries.remove(key)?;
        if let Some(hook) = &self.release_hook {
            hook(key, &value);
        }
        Some(value)
    }

    /// Snapshot of every entry currently held.
    pub fn get_all(&self) -> BTreeMap<String, V>
    where
        V: Clone,
    {
        self.entries.clone()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unregister every entry, returning the registry to its initial state.
    pub fn reset(&mut self) {
        if self.entries.is_empty() {
            return;
        }

        let released = self.release_all();
        info!(released = released, "Registry reset");
    }

    /// Borrow the registry for one operation; it is reset when the scope ends.
    pub fn scope(&mut self) -> RegistryScope<'_, V> {
        RegistryScope::new(self)
    }

    fn release_all(&mut self) -> usize {
        let keys: Vec<String> = self.entries.keys().cloned().collect();
        let count = keys.len();
        for key in keys {
            self.unregister(&key);
        }
        count
    }
}

impl<V> Drop for KeyedRegistry<V> {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl<V: fmt::Debug> fmt::Debug for KeyedRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedRegistry")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}
