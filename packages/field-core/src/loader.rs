use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::DiscoveryConfig;
use crate::error::FieldTypeError;
use crate::manifest::TypeBundle;
use crate::registry::{FieldTypeRegistry, TypeSource};
use crate::runtime::{TypeBuilder, WasmFieldType};
use crate::traits::FieldType;

/// A bundle the discovery cycle refused, with the reason.
#[derive(Debug)]
pub struct SkippedBundle {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one discovery cycle.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub skipped: Vec<SkippedBundle>,
}

/// Discovers and registers custom field-type bundles from the configured
/// theme and uploads directories.
pub struct TypeLoader {
    config: DiscoveryConfig,
}

impl TypeLoader {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    /// Scan both discovery directories and register every valid bundle.
    ///
    /// Malformed bundles are skipped with a warning; one broken upload must
    /// never take down the whole cycle.
    #[instrument(skip(self, registry))]
    pub fn load_all_custom_types(&self, registry: &FieldTypeRegistry) -> LoadReport {
        let mut report = LoadReport::default();
        let dirs = [
            (self.config.theme_dir.clone(), TypeSource::Theme),
            (self.config.uploads_dir.clone(), TypeSource::Uploaded),
        ];
        for (dir, source) in dirs {
            self.load_dir(&dir, source, registry, &mut report);
        }
        info!(
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            "Custom field-type discovery finished"
        );
        report
    }

    fn load_dir(
        &self,
        dir: &Path,
        source: TypeSource,
        registry: &FieldTypeRegistry,
        report: &mut LoadReport,
    ) {
        // A missing discovery directory just means nothing to load.
        if !dir.is_dir() {
            return;
        }
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read field-type directory {}: {e}", dir.display());
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            match self.load_bundle(&path, source, registry) {
                Ok(key) => {
                    info!(%key, ?source, "Registered custom field type");
                    report.loaded.push(key);
                }
                Err(e) => {
                    warn!("Skipping field-type bundle {}: {e}", path.display());
                    report.skipped.push(SkippedBundle {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    /// Load and register a single bundle directory.
    pub fn load_bundle(
        &self,
        bundle_dir: &Path,
        source: TypeSource,
        registry: &FieldTypeRegistry,
    ) -> Result<String, FieldTypeError> {
        let bundle = TypeBundle::load_from_dir(bundle_dir)?;
        let plugin = TypeBuilder::from_file(bundle.wasm_path())
            .with_wasi(self.config.enable_wasi)
            .build()?;
        let field_type = WasmFieldType::new(bundle.manifest, plugin)?;
        let key = field_type.key().to_string();
        registry.register(Arc::new(field_type), source)?;
        Ok(key)
    }
}
