//! Per-entity-type provider registry.

use std::collections::HashMap;

use catalog_indexer_shared::EntityType;
use tracing::debug;

use crate::descriptor::ProviderDescriptor;
use crate::errors::MappingError;
use crate::factory::{ProviderFactory, ResolvedProvider};

/// Descriptors registered under one slot key of an entity type.
///
/// A slot holding more than one descriptor is a group: its members are
/// ordered among themselves and expanded in place of the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceSlot {
    key: String,
    descriptors: Vec<ProviderDescriptor>,
}

impl DataSourceSlot {
    /// Create an empty slot.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            descriptors: Vec::new(),
        }
    }

    /// Append a descriptor to the slot.
    pub fn push(&mut self, descriptor: ProviderDescriptor) {
        self.descriptors.push(descriptor);
    }

    /// The slot key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> &[ProviderDescriptor] {
        &self.descriptors
    }

    /// Whether the slot groups several descriptors.
    pub fn is_group(&self) -> bool {
        self.descriptors.len() > 1
    }
}

/// Holds, per entity type, the descriptor slots of its enrichment providers.
///
/// Populated once at bootstrap and read for every mapped batch afterwards.
pub struct EntityDataSourceRegistry {
    factory: ProviderFactory,
    slots: HashMap<EntityType, Vec<DataSourceSlot>>,
}

impl EntityDataSourceRegistry {
    /// Create an empty registry instantiating providers through `factory`.
    pub fn new(factory: ProviderFactory) -> Self {
        Self {
            factory,
            slots: HashMap::new(),
        }
    }

    /// Append `descriptor` under `(entity_type, slot_key)`.
    pub fn add_datasource(
        &mut self,
        entity_type: impl Into<EntityType>,
        slot_key: impl Into<String>,
        descriptor: ProviderDescriptor,
    ) -> &mut Self {
        let entity_type = entity_type.into();
        let slot_key = slot_key.into();

        debug!(
            entity_type = %entity_type,
            slot = %slot_key,
            provider = %descriptor.reference(),
            "Registering data source"
        );

        let slots = self.slots.entry(entity_type).or_default();
        match slots.iter_mut().find(|slot| slot.key() == slot_key) {
            Some(slot) => slot.push(descriptor),
            None => {
                let mut slot = DataSourceSlot::new(slot_key);
                slot.push(descriptor);
                slots.push(slot);
            }
        }

        self
    }

    /// Slots registered for `entity_type`, in registration order.
    pub fn slots(&self, entity_type: &EntityType) -> &[DataSourceSlot] {
        self.slots
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether any provider is registered for `entity_type`.
    pub fn has_datasources(&self, entity_type: &EntityType) -> bool {
        !self.slots(entity_type).is_empty()
    }

    /// Instantiated providers for `entity_type` in merge order.
    ///
    /// An entity type without registrations yields an empty list.
    pub fn get_datasources_for_entity(
        &self,
        entity_type: &EntityType,
    ) -> Result<Vec<ResolvedProvider>, MappingError> {
        let slots = self.slots(entity_type);
        if slots.is_empty() {
            return Ok(Vec::new());
        }

        self.factory.create(slots)
    }
}
