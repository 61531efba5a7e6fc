use chrono::NaiveDate;
use serde_json::{Value, json};

use crate::error::FieldTypeError;
use crate::traits::{FieldType, RenderOptions, TypeCategory, render_raw};

/// Canonical stored date format.
const DATE_FORMAT: &str = "%Y-%m-%d";

fn scalar_to_string(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn max_length(config: &Value) -> Option<usize> {
    config
        .get("maxlength")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
}

fn normalize_text(raw: &Value, config: &Value, key: &str) -> Result<Value, FieldTypeError> {
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let s = scalar_to_string(raw)
        .ok_or_else(|| FieldTypeError::InvalidValue(format!("{key} expects a string value")))?;
    if let Some(max) = max_length(config)
        && s.chars().count() > max
    {
        return Err(FieldTypeError::InvalidValue(format!(
            "value exceeds maxlength {max}"
        )));
    }
    Ok(Value::String(s))
}

/// Single-line text.
pub struct TextType;

impl FieldType for TextType {
    fn key(&self) -> &str {
        "text"
    }

    fn label(&self) -> &str {
        "Text"
    }

    fn icon(&self) -> &str {
        "font"
    }

    fn category(&self) -> TypeCategory {
        TypeCategory::Basic
    }

    fn default_config(&self) -> Value {
        json!({ "placeholder": "" })
    }

    fn config_schema(&self) -> Value {
        json!({
            "placeholder": { "type": "string" },
            "maxlength": { "type": "integer", "min": 1 },
        })
    }

    fn normalize(&self, raw: &Value, config: &Value) -> Result<Value, FieldTypeError> {
        normalize_text(raw, config, self.key())
    }

    fn render(&self, value: &Value, _config: &Value, _opts: &RenderOptions) -> String {
        render_raw(value)
    }
}

/// Multi-line text.
pub struct TextareaType;

impl FieldType for TextareaType {
    fn key(&self) -> &str {
        "textarea"
    }

    fn label(&self) -> &str {
        "Text Area"
    }

    fn icon(&self) -> &str {
        "align-left"
    }

    fn category(&self) -> TypeCategory {
        TypeCategory::Basic
    }

    fn default_config(&self) -> Value {
        json!({ "rows": 4 })
    }

    fn config_schema(&self) -> Value {
        json!({
            "rows": { "type": "integer", "min": 1 },
            "maxlength": { "type": "integer", "min": 1 },
        })
    }

    fn normalize(&self, raw: &Value, config: &Value) -> Result<Value, FieldTypeError> {
        normalize_text(raw, config, self.key())
    }

    fn render(&self, value: &Value, _config: &Value, _opts: &RenderOptions) -> String {
        render_raw(value)
    }
}

pub struct NumberType;

impl FieldType for NumberType {
    fn key(&self) -> &str {
        "number"
    }

    fn label(&self) -> &str {
        "Number"
    }

    fn icon(&self) -> &str {
        "hashtag"
    }

    fn category(&self) -> TypeCategory {
        TypeCategory::Basic
    }

    fn config_schema(&self) -> Value {
        json!({
            "min": { "type": "number" },
            "max": { "type": "number" },
            "step": { "type": "number" },
        })
    }

    fn normalize(&self, raw: &Value, config: &Value) -> Result<Value, FieldTypeError> {
        let number = match raw {
            Value::Null => return Ok(Value::Null),
            Value::Number(n) => n.clone(),
            Value::String(s) => {
                let parsed: f64 = s.trim().parse().map_err(|_| {
                    FieldTypeError::InvalidValue(format!("'{s}' is not a number"))
                })?;
                serde_json::Number::from_f64(parsed)
                    .ok_or_else(|| FieldTypeError::InvalidValue("non-finite number".into()))?
            }
            _ => {
                return Err(FieldTypeError::InvalidValue(
                    "number expects a numeric value".into(),
                ));
            }
        };

        let as_f64 = number.as_f64().unwrap_or_default();
        if let Some(min) = config.get("min").and_then(Value::as_f64)
            && as_f64 < min
        {
            return Err(FieldTypeError::InvalidValue(format!("value below min {min}")));
        }
        if let Some(max) = config.get("max").and_then(Value::as_f64)
            && as_f64 > max
        {
            return Err(FieldTypeError::InvalidValue(format!("value above max {max}")));
        }

        Ok(Value::Number(number))
    }

    fn render(&self, value: &Value, _config: &Value, _opts: &RenderOptions) -> String {
        render_raw(value)
    }
}

pub struct TrueFalseType;

impl FieldType for TrueFalseType {
    fn key(&self) -> &str {
        "true_false"
    }

    fn label(&self) -> &str {
        "True / False"
    }

    fn icon(&self) -> &str {
        "toggle-on"
    }

    fn category(&self) -> TypeCategory {
        TypeCategory::Basic
    }

    fn default_config(&self) -> Value {
        json!({ "on_text": "Yes", "off_text": "No" })
    }

    fn normalize(&self, raw: &Value, _config: &Value) -> Result<Value, FieldTypeError> {
        match raw {
            Value::Null => Ok(Value::Null),
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(FieldTypeError::InvalidValue(
                    "true_false expects 0 or 1".into(),
                )),
            },
            Value::String(s) => match s.as_str() {
                "0" | "false" => Ok(Value::Bool(false)),
                "1" | "true" => Ok(Value::Bool(true)),
                _ => Err(FieldTypeError::InvalidValue(format!(
                    "'{s}' is not a boolean"
                ))),
            },
            _ => Err(FieldTypeError::InvalidValue(
                "true_false expects a boolean value".into(),
            )),
        }
    }

    fn render(&self, value: &Value, config: &Value, _opts: &RenderOptions) -> String {
        let on = config.get("on_text").and_then(Value::as_str).unwrap_or("Yes");
        let off = config
            .get("off_text")
            .and_then(Value::as_str)
            .unwrap_or("No");
        match value {
            Value::Bool(true) => on.to_string(),
            Value::Bool(false) => off.to_string(),
            other => render_raw(other),
        }
    }
}

pub struct DateType;

impl FieldType for DateType {
    fn key(&self) -> &str {
        "date"
    }

    fn label(&self) -> &str {
        "Date"
    }

    fn icon(&self) -> &str {
        "calendar"
    }

    fn category(&self) -> TypeCategory {
        TypeCategory::Basic
    }

    fn config_schema(&self) -> Value {
        json!({ "display_format": { "type": "string" } })
    }

    fn normalize(&self, raw: &Value, _config: &Value) -> Result<Value, FieldTypeError> {
        match raw {
            Value::Null => Ok(Value::Null),
            Value::String(s) => {
                let date = NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| {
                    FieldTypeError::InvalidValue(format!("'{s}' is not a YYYY-MM-DD date"))
                })?;
                Ok(Value::String(date.format(DATE_FORMAT).to_string()))
            }
            _ => Err(FieldTypeError::InvalidValue(
                "date expects a YYYY-MM-DD string".into(),
            )),
        }
    }

    fn render(&self, value: &Value, config: &Value, _opts: &RenderOptions) -> String {
        let Some(stored) = value.as_str() else {
            return render_raw(value);
        };
        if let (Some(format), Ok(date)) = (
            config.get("display_format").and_then(Value::as_str),
            NaiveDate::parse_from_str(stored, DATE_FORMAT),
        ) {
            // A bad user-supplied format string must not take down render.
            use std::fmt::Write;
            let mut out = String::new();
            if write!(out, "{}", date.format(format)).is_ok() {
                return out;
            }
        }
        stored.to_string()
    }
}
