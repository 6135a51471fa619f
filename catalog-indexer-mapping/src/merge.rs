//! Deep merge of provider contributions.
//!
//! Policy per value kind, applied field by field:
//! - field absent on the left: taken from the right
//! - map and map: merged recursively
//! - list and list: concatenated, left items first
//! - scalar and scalar: the right value wins
//! - `null` on either side: the right value wins
//! - any other pairing (list with scalar, map with list, ...) is a conflict

use serde_json::Value;
use thiserror::Error;

use catalog_indexer_shared::Document;

/// Two contributions disagree on the shape of a field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Field '{field}' holds {existing} but a provider returned {incoming}")]
pub struct MergeConflict {
    /// Dotted path of the conflicting field.
    pub field: String,
    /// Kind of the value already in the document.
    pub existing: &'static str,
    /// Kind of the value the provider returned.
    pub incoming: &'static str,
}

/// Merge `incoming` into `target` following the module policy.
pub fn deep_merge(target: &mut Document, incoming: Document) -> Result<(), MergeConflict> {
    merge_maps("", target, incoming)
}

fn merge_maps(prefix: &str, target: &mut Document, incoming: Document) -> Result<(), MergeConflict> {
    for (key, value) in incoming {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match target.get_mut(&key) {
            Some(existing) => merge_value(&path, existing, value)?,
            None => {
                target.insert(key, value);
            }
        }
    }
    Ok(())
}

fn merge_value(path: &str, existing: &mut Value, incoming: Value) -> Result<(), MergeConflict> {
    match (existing, incoming) {
        (Value::Object(left), Value::Object(right)) => merge_maps(path, left, right),
        (Value::Array(left), Value::Array(right)) => {
            left.extend(right);
            Ok(())
        }
        (existing @ Value::Null, incoming) => {
            *existing = incoming;
            Ok(())
        }
        (existing, Value::Null) => {
            *existing = Value::Null;
            Ok(())
        }
        (existing, incoming) if is_scalar(existing) && is_scalar(&incoming) => {
            *existing = incoming;
            Ok(())
        }
        (existing, incoming) => Err(MergeConflict {
            field: path.to_string(),
            existing: kind(existing),
            incoming: kind(&incoming),
        }),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {}", other),
        }
    }

    fn merged(base: Value, parts: Vec<Value>) -> Result<Value, MergeConflict> {
        let mut target = document(base);
        for part in parts {
            deep_merge(&mut target, document(part))?;
        }
        Ok(Value::Object(target))
    }

    #[test]
    fn test_disjoint_fields_union() {
        let result = merged(json!({}), vec![json!({"a": 1}), json!({"b": 2})]).unwrap();
        assert_eq!(result, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_scalar_last_wins() {
        let result = merged(json!({"f": "base"}), vec![json!({"f": "p1"}), json!({"f": "p2"})]).unwrap();
        assert_eq!(result, json!({"f": "p2"}));
    }

    #[test]
    fn test_lists_concatenate_in_order() {
        let result = merged(
            json!({}),
            vec![json!({"tags": ["x"]}), json!({"tags": ["y"]})],
        )
        .unwrap();
        assert_eq!(result, json!({"tags": ["x", "y"]}));
    }

    #[test]
    fn test_nested_maps_merge_recursively() {
        let result = merged(
            json!({"price": {"final": 10, "currency": "EUR"}}),
            vec![
                json!({"price": {"final": 9, "tiers": [1]}}),
                json!({"price": {"tiers": [2], "min": 5}}),
            ],
        )
        .unwrap();

        assert_eq!(
            result,
            json!({"price": {"final": 9, "currency": "EUR", "tiers": [1, 2], "min": 5}})
        );
    }

    #[test]
    fn test_null_is_replaceable_both_ways() {
        let result = merged(json!({"a": null, "b": [1]}), vec![json!({"a": [1], "b": null})]).unwrap();
        assert_eq!(result, json!({"a": [1], "b": null}));
    }

    #[test]
    fn test_list_scalar_conflict() {
        let err = merged(json!({}), vec![json!({"tags": ["x"]}), json!({"tags": "y"})]).unwrap_err();

        assert_eq!(err.field, "tags");
        assert_eq!(err.existing, "a list");
        assert_eq!(err.incoming, "a string");
    }

    #[test]
    fn test_nested_conflict_reports_path() {
        let err = merged(
            json!({"stock": {"qty": 1}}),
            vec![json!({"stock": {"qty": {"value": 1}}})],
        )
        .unwrap_err();

        assert_eq!(err.field, "stock.qty");
        assert_eq!(err.existing, "a number");
        assert_eq!(err.incoming, "a map");
    }

    #[test]
    fn test_merge_is_commutative_for_disjoint_keys() {
        let a = json!({"a": {"x": 1}});
        let b = json!({"b": [2], "c": true});

        let ab = merged(json!({}), vec![a.clone(), b.clone()]).unwrap();
        let ba = merged(json!({}), vec![b, a]).unwrap();
        assert_eq!(ab, ba);
    }
}
