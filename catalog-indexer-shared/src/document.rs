//! Document and context types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Context key carrying the entity type of the batch being mapped.
pub const ENTITY_TYPE_KEY: &str = "entity_type";

/// Context key carrying the store the batch is mapped for.
pub const STORE_ID_KEY: &str = "store_id";

/// Batch-local identifier of a document (the source row id).
pub type DocumentId = u64;

/// Identifier of the store (storefront / locale scope) a batch is built for.
pub type StoreId = u32;

/// A search document: field name to value.
pub type Document = Map<String, Value>;

/// A batch of documents keyed by their source id.
///
/// Ordered by id so that every stage of the pipeline walks a batch the same
/// way on every run.
pub type DocumentBatch = BTreeMap<DocumentId, Document>;

/// Identifies a class of indexable record, e.g. `"order"` or `"product"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
    /// Create a new entity type.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The entity type as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EntityType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for EntityType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Context shared by every provider call of one mapping batch.
///
/// Providers receive it by reference; it is never mutated once the batch
/// starts.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreContext {
    /// The store the documents are built for.
    pub store_id: StoreId,
    /// The entity type the batch belongs to.
    pub entity_type: EntityType,
    /// Free-form attributes supplied by the caller (locale, currency, ...).
    pub attributes: Map<String, Value>,
}

impl StoreContext {
    /// Create a context for the given store and entity type.
    pub fn new(store_id: StoreId, entity_type: impl Into<EntityType>) -> Self {
        Self {
            store_id,
            entity_type: entity_type.into(),
            attributes: Map::new(),
        }
    }

    /// Attach an extra attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up an extra attribute.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Flatten into a plain map, with the entity type and store id under
    /// their well-known keys.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.attributes.clone();
        map.insert(
            ENTITY_TYPE_KEY.to_string(),
            Value::String(self.entity_type.as_str().to_string()),
        );
        map.insert(STORE_ID_KEY.to_string(), Value::from(self.store_id));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_type_display_and_serde() {
        let entity_type = EntityType::from("product");
        assert_eq!(entity_type.to_string(), "product");
        assert_eq!(serde_json::to_value(&entity_type).unwrap(), json!("product"));

        let parsed: EntityType = serde_json::from_value(json!("order")).unwrap();
        assert_eq!(parsed.as_str(), "order");
    }

    #[test]
    fn test_context_to_map() {
        let context = StoreContext::new(2, "product").with_attribute("locale", "en_US");
        let map = context.to_map();

        assert_eq!(map[ENTITY_TYPE_KEY], json!("product"));
        assert_eq!(map[STORE_ID_KEY], json!(2));
        assert_eq!(map["locale"], json!("en_US"));
        assert_eq!(context.attribute("locale"), Some(&json!("en_US")));
    }
}
