//! Create/update input schemas and their conversion to field mappings.
//!
//! # Responsibility
//! - Convert structured inputs into `Fields` through serde.
//! - Unify "schema object or plain mapping" inputs behind `Input`.
//!
//! # Invariants
//! - A schema serializes to a flat JSON object; nested values are stored as
//!   JSON text.
//! - For update schemas, a field counts as explicitly set when it is
//!   serialized. Use `#[serde(skip_serializing_if = "Option::is_none")]` on
//!   optional fields to leave them unset.

use crate::model::Fields;
use crate::repo::crud_repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Structured input accepted by repository create/update paths.
pub trait Schema: Serialize {
    /// Every field of the schema as a mapping.
    fn to_fields(&self) -> RepoResult<Fields> {
        fields_from_serialize(self)
    }

    /// Only the fields the caller explicitly set.
    fn to_set_fields(&self) -> RepoResult<Fields> {
        self.to_fields()
    }
}

/// Repository input: a schema object or an already-built mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Input<S> {
    Schema(S),
    Fields(Fields),
}

impl<S: Schema> Input<S> {
    /// Full mapping used by create and find-or-create.
    pub fn to_fields(&self) -> RepoResult<Fields> {
        match self {
            Self::Schema(schema) => schema.to_fields(),
            Self::Fields(fields) => Ok(fields.clone()),
        }
    }

    /// Mapping used by update: set fields for schemas, the mapping as-is.
    pub fn explicit_fields(&self) -> RepoResult<Fields> {
        match self {
            Self::Schema(schema) => schema.to_set_fields(),
            Self::Fields(fields) => Ok(fields.clone()),
        }
    }
}

/// Serializes `value` into a flat `Fields` mapping.
///
/// # Errors
/// - `RepoError::Serialization` when serde fails.
/// - `RepoError::InvalidData` when `value` is not a struct/map.
pub fn fields_from_serialize<T: Serialize + ?Sized>(value: &T) -> RepoResult<Fields> {
    match serde_json::to_value(value)? {
        JsonValue::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| (key, json_to_value(value)))
            .collect()),
        other => Err(RepoError::InvalidData(format!(
            "schema must serialize to an object, got `{other}`"
        ))),
    }
}

fn json_to_value(value: JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(flag) => Value::Integer(i64::from(flag)),
        JsonValue::Number(number) => match number.as_i64() {
            Some(integer) => Value::Integer(integer),
            None => Value::Real(number.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(text) => Value::Text(text),
        nested @ (JsonValue::Array(_) | JsonValue::Object(_)) => Value::Text(nested.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{fields_from_serialize, Input, Schema};
    use crate::model::fields;
    use rusqlite::types::Value;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Patch {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<Option<String>>,
        active: bool,
        tags: Vec<String>,
    }

    impl Schema for Patch {}

    #[test]
    fn unset_options_are_omitted_and_explicit_null_is_kept() {
        let patch = Patch {
            name: None,
            note: Some(None),
            active: true,
            tags: vec!["a".to_string()],
        };

        let mapped = patch.to_set_fields().unwrap();
        assert!(!mapped.contains_key("name"));
        assert_eq!(mapped.get("note"), Some(&Value::Null));
        assert_eq!(mapped.get("active"), Some(&Value::Integer(1)));
        assert_eq!(mapped.get("tags"), Some(&Value::Text("[\"a\"]".to_string())));
    }

    #[test]
    fn mapping_input_is_used_as_is() {
        let mapping = fields([("anything", Value::Integer(7))]);
        let input: Input<Patch> = Input::Fields(mapping.clone());

        assert_eq!(input.to_fields().unwrap(), mapping);
        assert_eq!(input.explicit_fields().unwrap(), mapping);
    }

    #[test]
    fn non_object_schema_is_rejected() {
        assert!(fields_from_serialize(&42).is_err());
    }
}
