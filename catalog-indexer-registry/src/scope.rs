//! Operation-scoped access to a registry.

use std::ops::{Deref, DerefMut};

use crate::keyed::KeyedRegistry;

/// Exclusive borrow of a [`KeyedRegistry`] for one indexing operation.
///
/// Dereferences to the registry. When the scope ends, on success, early
/// return or unwinding alike, the registry is reset so no entity type leaks
/// into the next operation.
pub struct RegistryScope<'a, V> {
    registry: &'a mut KeyedRegistry<V>,
}

impl<'a, V> RegistryScope<'a, V> {
    pub(crate) fn new(registry: &'a mut KeyedRegistry<V>) -> Self {
        Self { registry }
    }
}

impl<V> Deref for RegistryScope<'_, V> {
    type Target = KeyedRegistry<V>;

    fn deref(&self) -> &Self::Target {
        self.registry
    }
}

impl<V> DerefMut for RegistryScope<'_, V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.registry
    }
}

impl<V> Drop for RegistryScope<'_, V> {
    fn drop(&mut self) {
        self.registry.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_resets_on_exit() {
        let mut registry = KeyedRegistry::new(|key: &str| Ok(key.len()));
        {
            let mut scope = registry.scope();
            scope.register("active", 7, false).unwrap();
            assert_eq!(*scope.get("abc").unwrap(), 3);
            assert_eq!(scope.len(), 2);
        }

        assert!(registry.is_empty());
    }

    #[test]
    fn test_scope_resets_on_early_return() {
        fn fails(registry: &mut KeyedRegistry<usize>) -> Result<(), String> {
            let mut scope = registry.scope();
            scope.register("active", 1, false).map_err(|e| e.to_string())?;
            Err("mapping failed".to_string())
        }

        let mut registry = KeyedRegistry::without_loader();
        assert!(fails(&mut registry).is_err());
        assert!(!registry.is_registered("active"));
    }
}
