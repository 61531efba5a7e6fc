use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::FieldTypeError;
use crate::traits::TypeCategory;

/// Manifest file expected at the root of every custom-type bundle.
pub const MANIFEST_FILE: &str = "field_type.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct TypeManifest {
    /// Registry key, e.g. "star_rating". Lowercase alphanumeric + underscore.
    pub key: String,
    pub label: String,
    pub version: String,
    pub description: Option<String>,

    #[serde(default = "default_category")]
    pub category: TypeCategory,

    #[serde(default)]
    pub icon: Option<String>,

    /// Whether values of this type may vary per language.
    #[serde(default = "default_translatable")]
    pub translatable: bool,

    /// Path to the Wasm file relative to the bundle root.
    pub entry: String,

    /// Default type-specific config for newly created fields.
    #[serde(default)]
    pub default_config: Value,

    /// Schema for the config options the builder UI may offer.
    #[serde(default)]
    pub config_schema: Value,
}

fn default_category() -> TypeCategory {
    TypeCategory::Basic
}

fn default_translatable() -> bool {
    true
}

impl TypeManifest {
    /// Structural validation, applied before a bundle is accepted anywhere.
    pub fn validate(&self) -> Result<(), FieldTypeError> {
        if self.key.is_empty()
            || !self
                .key
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(FieldTypeError::Rejected(format!(
                "key '{}' must be lowercase alphanumeric/underscore",
                self.key
            )));
        }
        if self.label.trim().is_empty() {
            return Err(FieldTypeError::Rejected("label must not be empty".into()));
        }
        if self.version.trim().is_empty() {
            return Err(FieldTypeError::Rejected("version must not be empty".into()));
        }
        if !self.entry.ends_with(".wasm") || self.entry.contains("..") {
            return Err(FieldTypeError::Rejected(format!(
                "entry '{}' must be a .wasm path inside the bundle",
                self.entry
            )));
        }
        Ok(())
    }
}

impl Display for TypeManifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (v{})", self.key, self.version)
    }
}

/// A custom-type bundle on disk: parsed manifest + root directory.
#[derive(Debug)]
pub struct TypeBundle {
    pub manifest: TypeManifest,
    pub root_dir: PathBuf,
}

impl TypeBundle {
    /// Loads a bundle from a directory by parsing its manifest.
    pub fn load_from_dir(bundle_dir: &Path) -> Result<Self, FieldTypeError> {
        if !bundle_dir.exists() || !bundle_dir.is_dir() {
            return Err(FieldTypeError::NotFound(bundle_dir.display().to_string()));
        }

        let toml_path = bundle_dir.join(MANIFEST_FILE);
        let toml_content = fs::read_to_string(&toml_path).map_err(|e| {
            FieldTypeError::LoadFailed(format!("Failed to read {MANIFEST_FILE}: {e}"))
        })?;

        let manifest: TypeManifest = toml::from_str(&toml_content).map_err(|e| {
            FieldTypeError::LoadFailed(format!("Invalid {MANIFEST_FILE} syntax: {e}"))
        })?;
        manifest.validate()?;

        Ok(Self {
            manifest,
            root_dir: bundle_dir.to_path_buf(),
        })
    }

    /// Absolute path of the Wasm entry declared by the manifest.
    pub fn wasm_path(&self) -> PathBuf {
        self.root_dir.join(&self.manifest.entry)
    }
}
