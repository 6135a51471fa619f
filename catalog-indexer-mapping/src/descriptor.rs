//! Provider descriptors.

use std::collections::BTreeSet;

/// What a provider is called for, declared once at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Contributes fields through `map`. Every provider must declare it.
    Map,
    /// Rewrites the merged document through `transform`.
    Transform,
}

/// Identifies one enrichment provider for an entity type.
///
/// Immutable once built; the registry only ever appends descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    reference: String,
    priority: Option<i32>,
    capabilities: BTreeSet<Capability>,
}

impl ProviderDescriptor {
    /// Describe the provider registered under `reference` in the container.
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            priority: None,
            capabilities: BTreeSet::from([Capability::Map]),
        }
    }

    /// Set an explicit priority; lower runs earlier in the merge.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Declare an additional capability.
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    /// Replace the declared capability set.
    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    /// Container reference of the provider.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Explicit priority, if any.
    pub fn priority(&self) -> Option<i32> {
        self.priority
    }

    /// Declared capabilities.
    pub fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.capabilities
    }

    /// Whether the descriptor declares `capability`.
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
