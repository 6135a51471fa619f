//! Provider instantiation and ordering.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::container::{Component, ProviderContainer};
use crate::datasource::DataSourceSlot;
use crate::descriptor::{Capability, ProviderDescriptor};
use crate::errors::MappingError;
use crate::provider::DocumentProvider;

/// A provider instance together with what its descriptor declared.
#[derive(Clone)]
pub struct ResolvedProvider {
    /// Container reference the provider was resolved from.
    pub reference: String,
    /// Effective priority used for ordering.
    pub priority: i32,
    /// Whether `transform` runs on the merged document.
    pub transforms: bool,
    /// The provider instance.
    pub provider: Arc<dyn DocumentProvider>,
}

impl fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("reference", &self.reference)
            .field("priority", &self.priority)
            .field("transforms", &self.transforms)
            .finish()
    }
}

/// Turns descriptor slots into an ordered list of provider instances.
///
/// Ordering rules:
/// - a provider's priority is the descriptor's explicit priority, else the
///   provider's own hint, else 0
/// - slots are ordered by the lowest priority among their members
/// - members of a grouped slot are ordered independently and expanded in
///   place
/// - all sorts are stable, so equal priorities keep registration order
pub struct ProviderFactory {
    container: Arc<dyn ProviderContainer>,
}

impl ProviderFactory {
    /// Create a factory resolving providers through `container`.
    pub fn new(container: Arc<dyn ProviderContainer>) -> Self {
        Self { container }
    }

    /// Instantiate and order the providers of the given slots.
    ///
    /// Every descriptor is resolved and validated before anything is
    /// returned, so a misconfigured provider fails the whole call.
    pub fn create(&self, slots: &[DataSourceSlot]) -> Result<Vec<ResolvedProvider>, MappingError> {
        let mut groups = Vec::with_capacity(slots.len());

        for slot in slots {
            let mut members = slot
                .descriptors()
                .iter()
                .map(|descriptor| self.instantiate(descriptor))
                .collect::<Result<Vec<_>, _>>()?;

            members.sort_by_key(|member| member.priority);

            let group_priority = members.first().map(|member| member.priority).unwrap_or(0);
            groups.push((group_priority, members));
        }

        groups.sort_by_key(|(priority, _)| *priority);

        let providers: Vec<ResolvedProvider> =
            groups.into_iter().flat_map(|(_, members)| members).collect();

        debug!(
            provider_count = providers.len(),
            order = ?providers.iter().map(|p| p.reference.as_str()).collect::<Vec<_>>(),
            "Resolved providers"
        );

        Ok(providers)
    }

    fn instantiate(&self, descriptor: &ProviderDescriptor) -> Result<ResolvedProvider, MappingError> {
        let reference = descriptor.reference();

        if !descriptor.has_capability(Capability::Map) {
            return Err(MappingError::config(format!(
                "Provider '{}' does not declare the map capability",
                reference
            )));
        }

        let provider = match self.container.resolve(reference) {
            Some(Component::Provider(provider)) => provider,
            Some(Component::Other { type_name }) => {
                return Err(MappingError::config(format!(
                    "Provider '{}' resolves to {}, which does not implement DocumentProvider",
                    reference, type_name
                )));
            }
            None => {
                return Err(MappingError::config(format!(
                    "Provider '{}' is not registered in the container",
                    reference
                )));
            }
        };

        let priority = descriptor
            .priority()
            .or_else(|| provider.priority())
            .unwrap_or(0);

        Ok(ResolvedProvider {
            reference: reference.to_string(),
            priority,
            transforms: descriptor.has_capability(Capability::Transform),
            provider,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ServiceContainer;
    use crate::provider::ProviderError;
    use async_trait::async_trait;
    use catalog_indexer_shared::{Document, StoreContext};

    struct HintedProvider {
        name: String,
        hint: Option<i32>,
    }

    #[async_trait]
    impl DocumentProvider for HintedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn priority(&self) -> Option<i32> {
            self.hint
        }

        async fn map(
            &self,
            _document: Document,
            _context: &StoreContext,
        ) -> Result<Document, ProviderError> {
            Ok(Document::new())
        }
    }

    fn container(entries: &[(&str, Option<i32>)]) -> Arc<ServiceContainer> {
        let mut container = ServiceContainer::new();
        for (name, hint) in entries {
            container.register_provider(
                *name,
                Arc::new(HintedProvider {
                    name: name.to_string(),
                    hint: *hint,
                }),
            );
        }
        container.register_component("logger", "Logger");
        Arc::new(container)
    }

    fn slot(key: &str, descriptors: Vec<ProviderDescriptor>) -> DataSourceSlot {
        let mut slot = DataSourceSlot::new(key);
        for descriptor in descriptors {
            slot.push(descriptor);
        }
        slot
    }

    fn references(providers: &[ResolvedProvider]) -> Vec<&str> {
        providers.iter().map(|p| p.reference.as_str()).collect()
    }

    #[test]
    fn test_orders_by_priority() {
        let factory = ProviderFactory::new(container(&[("a", None), ("b", None), ("c", None)]));
        let slots = vec![
            slot("a", vec![ProviderDescriptor::new("a").with_priority(20)]),
            slot("b", vec![ProviderDescriptor::new("b").with_priority(-1)]),
            slot("c", vec![ProviderDescriptor::new("c")]),
        ];

        let providers = factory.create(&slots).unwrap();
        assert_eq!(references(&providers), vec!["b", "c", "a"]);
        assert_eq!(providers[1].priority, 0);
    }

    #[test]
    fn test_ties_keep_registration_order() {
        let factory = ProviderFactory::new(container(&[("x", None), ("y", None), ("z", None)]));
        let slots = vec![
            slot("y", vec![ProviderDescriptor::new("y").with_priority(5)]),
            slot("x", vec![ProviderDescriptor::new("x").with_priority(5)]),
            slot("z", vec![ProviderDescriptor::new("z").with_priority(5)]),
        ];

        for _ in 0..10 {
            let providers = factory.create(&slots).unwrap();
            assert_eq!(references(&providers), vec!["y", "x", "z"]);
        }
    }

    #[test]
    fn test_priority_hint_used_when_descriptor_has_none() {
        let factory = ProviderFactory::new(container(&[("hinted", Some(-10)), ("plain", None)]));
        let slots = vec![
            slot("plain", vec![ProviderDescriptor::new("plain")]),
            slot("hinted", vec![ProviderDescriptor::new("hinted")]),
        ];

        let providers = factory.create(&slots).unwrap();
        assert_eq!(references(&providers), vec!["hinted", "plain"]);

        let overridden = vec![slot(
            "hinted",
            vec![ProviderDescriptor::new("hinted").with_priority(3)],
        )];
        assert_eq!(factory.create(&overridden).unwrap()[0].priority, 3);
    }

    #[test]
    fn test_grouped_slot_sorted_independently() {
        let factory = ProviderFactory::new(container(&[
            ("first", None),
            ("g1", None),
            ("g2", None),
            ("g3", None),
            ("last", None),
        ]));
        let slots = vec![
            slot("last", vec![ProviderDescriptor::new("last").with_priority(50)]),
            slot(
                "group",
                vec![
                    ProviderDescriptor::new("g1").with_priority(30),
                    ProviderDescriptor::new("g2").with_priority(10),
                    ProviderDescriptor::new("g3").with_priority(20),
                ],
            ),
            slot("first", vec![ProviderDescriptor::new("first").with_priority(0)]),
        ];

        let providers = factory.create(&slots).unwrap();
        assert_eq!(
            references(&providers),
            vec!["first", "g2", "g3", "g1", "last"]
        );
    }

    #[test]
    fn test_non_provider_component_is_configuration_error() {
        let factory = ProviderFactory::new(container(&[("a", None)]));
        let slots = vec![
            slot("a", vec![ProviderDescriptor::new("a")]),
            slot("logger", vec![ProviderDescriptor::new("logger")]),
        ];

        let err = factory.create(&slots).unwrap_err();
        assert!(matches!(err, MappingError::Configuration(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unknown_reference_is_configuration_error() {
        let factory = ProviderFactory::new(container(&[]));
        let slots = vec![slot("ghost", vec![ProviderDescriptor::new("ghost")])];

        assert!(matches!(
            factory.create(&slots),
            Err(MappingError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_map_capability_is_configuration_error() {
        let factory = ProviderFactory::new(container(&[("a", None)]));
        let slots = vec![slot(
            "a",
            vec![ProviderDescriptor::new("a").with_capabilities([Capability::Transform])],
        )];

        assert!(matches!(
            factory.create(&slots),
            Err(MappingError::Configuration(_))
        ));
    }

    #[test]
    fn test_transform_capability_is_carried() {
        let factory = ProviderFactory::new(container(&[("a", None)]));
        let slots = vec![slot(
            "a",
            vec![ProviderDescriptor::new("a").with_capability(Capability::Transform)],
        )];

        assert!(factory.create(&slots).unwrap()[0].transforms);
    }
}
