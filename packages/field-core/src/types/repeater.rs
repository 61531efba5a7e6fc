use serde_json::{Value, json};

use crate::error::FieldTypeError;
use crate::traits::{FieldType, RenderOptions, TypeCategory};

/// A repeating group of subfields, stored as an array of row objects keyed
/// by subfield slug. This type validates structure only; the engine, which
/// owns the child field definitions, normalizes each cell through the
/// child's own type.
pub struct RepeaterType;

impl FieldType for RepeaterType {
    fn key(&self) -> &str {
        "repeater"
    }

    fn label(&self) -> &str {
        "Repeater"
    }

    fn icon(&self) -> &str {
        "layer-group"
    }

    fn category(&self) -> TypeCategory {
        TypeCategory::Layout
    }

    /// Rows carry their own translatable cells; the row structure itself is
    /// shared across languages.
    fn supports_translation(&self) -> bool {
        false
    }

    fn config_schema(&self) -> Value {
        json!({
            "min_rows": { "type": "integer", "min": 0 },
            "max_rows": { "type": "integer", "min": 1 },
        })
    }

    fn normalize(&self, raw: &Value, config: &Value) -> Result<Value, FieldTypeError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }
        let rows = raw
            .as_array()
            .ok_or_else(|| FieldTypeError::InvalidValue("repeater expects an array of rows".into()))?;
        for (i, row) in rows.iter().enumerate() {
            if !row.is_object() {
                return Err(FieldTypeError::InvalidValue(format!(
                    "repeater row {i} is not an object"
                )));
            }
        }

        if let Some(min) = config.get("min_rows").and_then(Value::as_u64)
            && (rows.len() as u64) < min
        {
            return Err(FieldTypeError::InvalidValue(format!(
                "repeater requires at least {min} rows"
            )));
        }
        if let Some(max) = config.get("max_rows").and_then(Value::as_u64)
            && rows.len() as u64 > max
        {
            return Err(FieldTypeError::InvalidValue(format!(
                "repeater holds at most {max} rows"
            )));
        }

        Ok(raw.clone())
    }

    fn render(&self, value: &Value, _config: &Value, _opts: &RenderOptions) -> String {
        match value.as_array().map(|rows| rows.len()) {
            Some(1) => "1 row".to_string(),
            Some(n) => format!("{n} rows"),
            None => String::new(),
        }
    }
}
