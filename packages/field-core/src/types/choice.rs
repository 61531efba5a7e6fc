use serde_json::{Value, json};

use crate::error::FieldTypeError;
use crate::traits::{FieldType, RenderOptions, TypeCategory, render_raw};

/// Select with configurable choices; `multiple: true` stores an array.
pub struct SelectType;

impl SelectType {
    fn choice_values(config: &Value) -> Vec<String> {
        config
            .get("choices")
            .and_then(Value::as_array)
            .map(|choices| {
                choices
                    .iter()
                    .filter_map(|c| c.get("value").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn label_for<'a>(config: &'a Value, value: &str) -> Option<&'a str> {
        config
            .get("choices")
            .and_then(Value::as_array)?
            .iter()
            .find(|c| c.get("value").and_then(Value::as_str) == Some(value))
            .and_then(|c| c.get("label").and_then(Value::as_str))
    }

    fn check_choice(value: &Value, allowed: &[String]) -> Result<String, FieldTypeError> {
        let s = value
            .as_str()
            .ok_or_else(|| FieldTypeError::InvalidValue("select expects string choices".into()))?;
        if !allowed.iter().any(|a| a == s) {
            return Err(FieldTypeError::InvalidValue(format!(
                "'{s}' is not a configured choice"
            )));
        }
        Ok(s.to_string())
    }
}

impl FieldType for SelectType {
    fn key(&self) -> &str {
        "select"
    }

    fn label(&self) -> &str {
        "Select"
    }

    fn icon(&self) -> &str {
        "list"
    }

    fn category(&self) -> TypeCategory {
        TypeCategory::Choice
    }

    fn default_config(&self) -> Value {
        json!({ "choices": [], "multiple": false })
    }

    fn config_schema(&self) -> Value {
        json!({
            "choices": {
                "type": "array",
                "items": {
                    "value": { "type": "string" },
                    "label": { "type": "string" },
                },
            },
            "multiple": { "type": "boolean" },
        })
    }

    fn normalize(&self, raw: &Value, config: &Value) -> Result<Value, FieldTypeError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }

        let allowed = Self::choice_values(config);
        let multiple = config
            .get("multiple")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        if multiple {
            let items = raw.as_array().ok_or_else(|| {
                FieldTypeError::InvalidValue("multi-select expects an array".into())
            })?;
            let mut selected: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                let s = Self::check_choice(item, &allowed)?;
                if !selected.iter().any(|v| v.as_str() == Some(&s)) {
                    selected.push(Value::String(s));
                }
            }
            Ok(Value::Array(selected))
        } else {
            Ok(Value::String(Self::check_choice(raw, &allowed)?))
        }
    }

    fn render(&self, value: &Value, config: &Value, opts: &RenderOptions) -> String {
        let display = |v: &str| -> String {
            Self::label_for(config, v).unwrap_or(v).to_string()
        };
        match value {
            Value::String(s) => display(s),
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(display)
                .collect::<Vec<_>>()
                .join(opts.separator()),
            other => render_raw(other),
        }
    }
}
