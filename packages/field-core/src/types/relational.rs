use serde_json::{Value, json};

use crate::error::FieldTypeError;
use crate::traits::{FieldType, RenderOptions, TypeCategory, render_raw};

/// References to other entities, stored as an ordered array of ids.
/// Resolving ids to titles is the caller's job; the stored form is id-only
/// so values survive renames.
pub struct RelationType;

impl FieldType for RelationType {
    fn key(&self) -> &str {
        "relation"
    }

    fn label(&self) -> &str {
        "Relation"
    }

    fn icon(&self) -> &str {
        "share-nodes"
    }

    fn category(&self) -> TypeCategory {
        TypeCategory::Relational
    }

    /// Relations point at entities, not texts; one set of ids serves every
    /// language.
    fn supports_translation(&self) -> bool {
        false
    }

    fn default_config(&self) -> Value {
        json!({ "multiple": true })
    }

    fn config_schema(&self) -> Value {
        json!({
            "entity_type": { "type": "string" },
            "multiple": { "type": "boolean" },
            "max": { "type": "integer", "min": 1 },
        })
    }

    fn normalize(&self, raw: &Value, config: &Value) -> Result<Value, FieldTypeError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }

        let items: Vec<&Value> = match raw {
            Value::Array(a) => a.iter().collect(),
            single => vec![single],
        };

        let mut ids: Vec<i64> = Vec::with_capacity(items.len());
        for item in items {
            let id = item.as_i64().ok_or_else(|| {
                FieldTypeError::InvalidValue("relation expects integer ids".into())
            })?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        if let Some(max) = config.get("max").and_then(Value::as_u64)
            && ids.len() as u64 > max
        {
            return Err(FieldTypeError::InvalidValue(format!(
                "relation holds at most {max} entries"
            )));
        }
        if !config
            .get("multiple")
            .and_then(Value::as_bool)
            .unwrap_or(true)
            && ids.len() > 1
        {
            return Err(FieldTypeError::InvalidValue(
                "relation is configured single-valued".into(),
            ));
        }

        Ok(json!(ids))
    }

    fn render(&self, value: &Value, _config: &Value, opts: &RenderOptions) -> String {
        match value.as_array() {
            Some(ids) => ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(opts.separator()),
            None => render_raw(value),
        }
    }
}
