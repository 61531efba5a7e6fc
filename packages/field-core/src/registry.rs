use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::error::FieldTypeError;
use crate::traits::{FieldType, TypeCategory};

/// Where a registered type came from. Core types cannot be shadowed or
/// removed; theme and uploaded types can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeSource {
    Core,
    Theme,
    Uploaded,
}

/// Represents an entry in the type registry.
pub struct RegisteredType {
    pub field_type: Arc<dyn FieldType>,
    pub source: TypeSource,
}

/// Public information about a registered type, suitable for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct TypeInfo {
    pub key: String,
    pub label: String,
    pub icon: String,
    pub category: TypeCategory,
    pub source: TypeSource,
    pub translatable: bool,
}

impl From<&RegisteredType> for TypeInfo {
    fn from(entry: &RegisteredType) -> Self {
        Self {
            key: entry.field_type.key().to_string(),
            label: entry.field_type.label().to_string(),
            icon: entry.field_type.icon().to_string(),
            category: entry.field_type.category(),
            source: entry.source,
            translatable: entry.field_type.supports_translation(),
        }
    }
}

/// Mapping from type-key string to a field-type strategy instance.
pub struct FieldTypeRegistry {
    inner: RwLock<HashMap<String, RegisteredType>>,
}

impl FieldTypeRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Registry pre-populated with every built-in type.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for field_type in crate::types::builtins() {
            // Builtin keys are distinct by construction.
            let _ = registry.register(field_type, TypeSource::Core);
        }
        registry
    }

    /// Look up a type by key. Unknown keys return `None`, never an error;
    /// callers decide what to do without a strategy.
    pub fn get(&self, key: &str) -> Option<Arc<dyn FieldType>> {
        let inner = self.inner.read().ok()?;
        inner.get(key).map(|entry| Arc::clone(&entry.field_type))
    }

    pub fn source_of(&self, key: &str) -> Option<TypeSource> {
        let inner = self.inner.read().ok()?;
        inner.get(key).map(|entry| entry.source)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .read()
            .map(|inner| inner.contains_key(key))
            .unwrap_or(false)
    }

    pub fn register(
        &self,
        field_type: Arc<dyn FieldType>,
        source: TypeSource,
    ) -> Result<(), FieldTypeError> {
        let key = field_type.key().to_string();
        let mut inner = self
            .inner
            .write()
            .map_err(|_| FieldTypeError::Internal("registry lock poisoned".into()))?;

        if let Some(existing) = inner.get(&key)
            && existing.source == TypeSource::Core
        {
            return Err(FieldTypeError::Rejected(format!(
                "'{key}' would shadow a core type"
            )));
        }

        inner.insert(key, RegisteredType { field_type, source });
        Ok(())
    }

    /// Remove a theme or uploaded type. Core types are refused.
    pub fn remove(&self, key: &str) -> Result<TypeSource, FieldTypeError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| FieldTypeError::Internal("registry lock poisoned".into()))?;

        let entry = inner
            .get(key)
            .ok_or_else(|| FieldTypeError::NotFound(key.to_string()))?;
        if entry.source == TypeSource::Core {
            return Err(FieldTypeError::Rejected(format!(
                "'{key}' is a core type and cannot be removed"
            )));
        }

        let source = entry.source;
        inner.remove(key);
        Ok(source)
    }

    /// All registered types, sorted by key.
    pub fn all(&self) -> Vec<TypeInfo> {
        let mut infos: Vec<TypeInfo> = self
            .inner
            .read()
            .map(|inner| inner.values().map(TypeInfo::from).collect())
            .unwrap_or_default();
        infos.sort_by(|a, b| a.key.cmp(&b.key));
        infos
    }

    /// All registered types grouped by display category.
    pub fn all_by_category(&self) -> BTreeMap<TypeCategory, Vec<TypeInfo>> {
        let mut grouped: BTreeMap<TypeCategory, Vec<TypeInfo>> = BTreeMap::new();
        for info in self.all() {
            grouped.entry(info.category).or_default().push(info);
        }
        grouped
    }
}

impl Default for FieldTypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
