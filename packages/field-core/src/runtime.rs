use std::path::PathBuf;
use std::sync::Mutex;

use extism::{Manifest, Plugin, Wasm};
use serde_json::{Value, json};
use tracing::warn;

use crate::error::FieldTypeError;
use crate::manifest::TypeManifest;
use crate::traits::{FieldType, RenderOptions, TypeCategory, render_raw};

/// Exports every custom-type Wasm module must provide.
pub const REQUIRED_EXPORTS: &[&str] = &["normalize_value", "render_value"];

/// Builder for creating Extism Plugin instances from a bundle.
pub struct TypeBuilder {
    source: WasmSource,
    wasi_enabled: bool,
}

enum WasmSource {
    File(PathBuf),
    Bytes(Vec<u8>),
}

impl TypeBuilder {
    pub fn from_file(wasm_path: PathBuf) -> Self {
        Self {
            source: WasmSource::File(wasm_path),
            wasi_enabled: false,
        }
    }

    /// Build from in-memory bytes; used by the upload path to validate a
    /// module before anything touches the bundle directories.
    pub fn from_bytes(wasm_bytes: Vec<u8>) -> Self {
        Self {
            source: WasmSource::Bytes(wasm_bytes),
            wasi_enabled: false,
        }
    }

    pub fn with_wasi(mut self, enable: bool) -> Self {
        self.wasi_enabled = enable;
        self
    }

    pub fn build(self) -> Result<Plugin, FieldTypeError> {
        let wasm = match self.source {
            WasmSource::File(path) => {
                if !path.exists() {
                    return Err(FieldTypeError::NotFound(format!(
                        "Wasm binary not found at {path:?}"
                    )));
                }
                Wasm::file(&path)
            }
            WasmSource::Bytes(bytes) => Wasm::data(bytes),
        };

        let manifest = Manifest::new([wasm]);
        Plugin::new(&manifest, [], self.wasi_enabled).map_err(FieldTypeError::Extism)
    }
}

/// A custom field type backed by a Wasm module.
///
/// Extism plugins are stateful and single-threaded, so the instance is
/// wrapped in a Mutex and calls are serialized.
pub struct WasmFieldType {
    manifest: TypeManifest,
    plugin: Mutex<Plugin>,
}

impl WasmFieldType {
    /// Wrap a plugin after checking it provides every required export.
    pub fn new(manifest: TypeManifest, plugin: Plugin) -> Result<Self, FieldTypeError> {
        for export in REQUIRED_EXPORTS {
            if !plugin.function_exists(export) {
                return Err(FieldTypeError::Rejected(format!(
                    "module for '{}' does not export '{export}'",
                    manifest.key
                )));
            }
        }

        Ok(Self {
            manifest,
            plugin: Mutex::new(plugin),
        })
    }

    pub fn manifest(&self) -> &TypeManifest {
        &self.manifest
    }

    fn call(&self, func_name: &str, input: Value) -> Result<Value, FieldTypeError> {
        let mut plugin = self
            .plugin
            .lock()
            .map_err(|_| FieldTypeError::Internal("plugin mutex poisoned".into()))?;

        let input_bytes = serde_json::to_vec(&input)?;
        let output_bytes: Vec<u8> = plugin
            .call(func_name, input_bytes)
            .map_err(|e| FieldTypeError::ExecutionFailed(e.to_string()))?;

        Ok(serde_json::from_slice(&output_bytes)?)
    }
}

impl FieldType for WasmFieldType {
    fn key(&self) -> &str {
        &self.manifest.key
    }

    fn label(&self) -> &str {
        &self.manifest.label
    }

    fn icon(&self) -> &str {
        self.manifest.icon.as_deref().unwrap_or("puzzle-piece")
    }

    fn category(&self) -> TypeCategory {
        self.manifest.category
    }

    fn supports_translation(&self) -> bool {
        self.manifest.translatable
    }

    fn default_config(&self) -> Value {
        if self.manifest.default_config.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            self.manifest.default_config.clone()
        }
    }

    fn config_schema(&self) -> Value {
        self.manifest.config_schema.clone()
    }

    fn normalize(&self, raw: &Value, config: &Value) -> Result<Value, FieldTypeError> {
        self.call("normalize_value", json!({ "value": raw, "config": config }))
    }

    fn render(&self, value: &Value, config: &Value, opts: &RenderOptions) -> String {
        let input = json!({
            "value": value,
            "config": config,
            "separator": opts.separator(),
        });
        match self.call("render_value", input) {
            Ok(Value::String(s)) => s,
            Ok(other) => other.to_string(),
            Err(e) => {
                warn!(key = %self.manifest.key, "render_value failed: {e}");
                render_raw(value)
            }
        }
    }
}
