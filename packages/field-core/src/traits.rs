use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FieldTypeError;

/// Display grouping used by the type picker.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TypeCategory {
    Basic,
    Choice,
    Content,
    Relational,
    Layout,
}

impl TypeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Choice => "choice",
            Self::Content => "content",
            Self::Relational => "relational",
            Self::Layout => "layout",
        }
    }
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options influencing `FieldType::render`.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Separator for multi-valued types. Defaults to ", " when unset.
    pub separator: Option<String>,
}

impl RenderOptions {
    pub fn separator(&self) -> &str {
        self.separator.as_deref().unwrap_or(", ")
    }
}

/// A single field-type strategy.
///
/// A type owns the shape of its stored value: `normalize` turns arbitrary
/// caller input into the canonical stored form (or rejects it), and `render`
/// produces a lossy display string from a stored value. Editor markup is the
/// host platform's concern and is deliberately not part of this contract.
pub trait FieldType: Send + Sync {
    /// Registry discriminator, e.g. "text", "select", "repeater".
    fn key(&self) -> &str;

    /// Human-readable name shown in the type picker.
    fn label(&self) -> &str;

    /// Icon identifier for the type picker.
    fn icon(&self) -> &str;

    fn category(&self) -> TypeCategory;

    /// Whether values of this type may vary per language.
    fn supports_translation(&self) -> bool {
        true
    }

    /// Default type-specific config for newly created fields.
    fn default_config(&self) -> Value {
        Value::Object(serde_json::Map::new())
    }

    /// Schema describing the config options the builder UI may offer.
    fn config_schema(&self) -> Value {
        Value::Object(serde_json::Map::new())
    }

    /// Canonical stored form of a raw value, or `InvalidValue`.
    fn normalize(&self, raw: &Value, config: &Value) -> Result<Value, FieldTypeError>;

    /// Lossy display string for a stored value.
    fn render(&self, value: &Value, config: &Value, opts: &RenderOptions) -> String;
}

/// Fallback display form for values no type can render: strings verbatim,
/// everything else as compact JSON.
pub fn render_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
