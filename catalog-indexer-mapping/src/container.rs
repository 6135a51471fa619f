//! Provider instantiation boundary.
//!
//! The factory never builds providers itself; it asks a container supplied
//! by the surrounding application to resolve each descriptor reference.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::provider::DocumentProvider;

/// What a container reference resolves to.
#[derive(Clone)]
pub enum Component {
    /// A component implementing the provider contract.
    Provider(Arc<dyn DocumentProvider>),
    /// A component of some other kind, named by its type.
    Other { type_name: String },
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider(provider) => f.debug_tuple("Provider").field(&provider.name()).finish(),
            Self::Other { type_name } => f.debug_struct("Other").field("type_name", type_name).finish(),
        }
    }
}

/// Resolves descriptor references to component instances.
pub trait ProviderContainer: Send + Sync {
    /// Resolve `reference`, or `None` when nothing is registered under it.
    fn resolve(&self, reference: &str) -> Option<Component>;
}

type ComponentFactory = Arc<dyn Fn() -> Component + Send + Sync>;

/// In-process container keyed by reference.
#[derive(Default)]
pub struct ServiceContainer {
    factories: HashMap<String, ComponentFactory>,
}

impl ServiceContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shared provider instance.
    pub fn register_provider(
        &mut self,
        reference: impl Into<String>,
        provider: Arc<dyn DocumentProvider>,
    ) -> &mut Self {
        self.factories.insert(
            reference.into(),
            Arc::new(move || Component::Provider(provider.clone())),
        );
        self
    }

    /// Register a factory that builds a fresh provider on every resolution.
    pub fn register_factory<F, P>(&mut self, reference: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: DocumentProvider + 'static,
    {
        self.factories.insert(
            reference.into(),
            Arc::new(move || Component::Provider(Arc::new(factory()))),
        );
        self
    }

    /// Register a component that is not a provider (a service, a helper).
    pub fn register_component(
        &mut self,
        reference: impl Into<String>,
        type_name: impl Into<String>,
    ) -> &mut Self {
        let type_name = type_name.into();
        self.factories.insert(
            reference.into(),
            Arc::new(move || Component::Other {
                type_name: type_name.clone(),
            }),
        );
        self
    }

    /// Whether anything is registered under `reference`.
    pub fn contains(&self, reference: &str) -> bool {
        self.factories.contains_key(reference)
    }
}

impl ProviderContainer for ServiceContainer {
    fn resolve(&self, reference: &str) -> Option<Component> {
        self.factories.get(reference).map(|factory| factory())
    }
}
