use std::path::PathBuf;

use serde::Deserialize;

/// Where custom field-type bundles are discovered.
///
/// `theme_dir` holds types shipped with a theme; `uploads_dir` holds types
/// installed through the upload path. Both directories contain one
/// subdirectory per bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    pub theme_dir: PathBuf,
    pub uploads_dir: PathBuf,
    #[serde(default = "default_enable_wasi")]
    pub enable_wasi: bool,
}

fn default_enable_wasi() -> bool {
    true
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            theme_dir: PathBuf::from("./theme/field_types"),
            uploads_dir: PathBuf::from("./uploads/field_types"),
            enable_wasi: true,
        }
    }
}
