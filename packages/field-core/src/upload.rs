use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Component, Path};
use std::sync::Arc;

use flate2::read::GzDecoder;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tar::Archive;
use tracing::{info, instrument};

use crate::config::DiscoveryConfig;
use crate::error::FieldTypeError;
use crate::manifest::{MANIFEST_FILE, TypeManifest};
use crate::registry::{FieldTypeRegistry, TypeSource};
use crate::runtime::{TypeBuilder, WasmFieldType};

/// Maximum decompressed size per file inside an uploaded bundle (16 MB).
const MAX_DECOMPRESSED_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Maximum total decompressed size across an uploaded bundle (64 MB).
const MAX_TOTAL_DECOMPRESSED_SIZE: u64 = 64 * 1024 * 1024;

/// Maximum number of files in an uploaded bundle.
const MAX_BUNDLE_FILES: usize = 64;

/// Result of a successful field-type installation.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub key: String,
    pub label: String,
    pub version: String,
    /// SHA-256 of the Wasm entry, hex-encoded.
    pub checksum: String,
}

/// Install an uploaded field-type bundle after strict validation.
///
/// Executing an uploaded module is a real security boundary: nothing is
/// persisted or registered until the archive shape, the manifest, and the
/// Wasm exports have all been checked. Anything that does not look like a
/// complete field-type bundle is rejected outright.
#[instrument(skip(config, registry, archive_path))]
pub fn install_uploaded_type(
    config: &DiscoveryConfig,
    registry: &FieldTypeRegistry,
    archive_path: &Path,
    filename: &str,
) -> Result<UploadOutcome, FieldTypeError> {
    if !filename.ends_with(".tar.gz") && !filename.ends_with(".tgz") {
        return Err(FieldTypeError::Rejected(format!(
            "'{filename}' is not a .tar.gz bundle"
        )));
    }

    let archive_bytes = fs::read(archive_path)?;
    let files = read_bundle_archive(&archive_bytes)?;

    let manifest_bytes = files.get(MANIFEST_FILE).ok_or_else(|| {
        FieldTypeError::Rejected(format!("bundle does not contain {MANIFEST_FILE}"))
    })?;
    let manifest_str = std::str::from_utf8(manifest_bytes)
        .map_err(|_| FieldTypeError::Rejected(format!("{MANIFEST_FILE} is not valid UTF-8")))?;
    let manifest: TypeManifest = toml::from_str(manifest_str)
        .map_err(|e| FieldTypeError::Rejected(format!("invalid {MANIFEST_FILE}: {e}")))?;
    manifest.validate()?;

    let wasm_bytes = files.get(&manifest.entry).ok_or_else(|| {
        FieldTypeError::Rejected(format!("entry '{}' missing from bundle", manifest.entry))
    })?;

    if registry.source_of(&manifest.key) == Some(TypeSource::Core) {
        return Err(FieldTypeError::Rejected(format!(
            "'{}' would shadow a core type",
            manifest.key
        )));
    }

    let install_dir = config.uploads_dir.join(&manifest.key);
    if install_dir.exists() {
        return Err(FieldTypeError::Rejected(format!(
            "'{}' is already installed; remove it first",
            manifest.key
        )));
    }

    // Validate the module fully in memory before anything lands on disk.
    let plugin = TypeBuilder::from_bytes(wasm_bytes.clone())
        .with_wasi(config.enable_wasi)
        .build()?;
    let field_type = WasmFieldType::new(manifest.clone(), plugin)?;

    let checksum = hex::encode(Sha256::digest(wasm_bytes));

    persist_bundle(&install_dir, &files).inspect_err(|_| {
        let _ = fs::remove_dir_all(&install_dir);
    })?;

    if let Err(e) = registry.register(Arc::new(field_type), TypeSource::Uploaded) {
        let _ = fs::remove_dir_all(&install_dir);
        return Err(e);
    }

    info!(key = %manifest.key, %checksum, "Installed uploaded field type");
    Ok(UploadOutcome {
        key: manifest.key,
        label: manifest.label,
        version: manifest.version,
        checksum,
    })
}

/// Remove an uploaded or theme field type. Core types are refused.
#[instrument(skip(config, registry))]
pub fn remove_custom_type(
    config: &DiscoveryConfig,
    registry: &FieldTypeRegistry,
    key: &str,
) -> Result<(), FieldTypeError> {
    let source = registry.remove(key)?;
    let bundle_dir = match source {
        TypeSource::Theme => config.theme_dir.join(key),
        TypeSource::Uploaded => config.uploads_dir.join(key),
        // remove() never returns Core
        TypeSource::Core => return Ok(()),
    };
    if bundle_dir.exists() {
        fs::remove_dir_all(&bundle_dir)?;
    }
    info!(%key, ?source, "Removed custom field type");
    Ok(())
}

fn persist_bundle(
    install_dir: &Path,
    files: &BTreeMap<String, Vec<u8>>,
) -> Result<(), FieldTypeError> {
    for (name, bytes) in files {
        let target = install_dir.join(name);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, bytes)?;
    }
    Ok(())
}

/// Decompress the archive into memory, rejecting anything suspicious:
/// traversal paths, oversized files, oversized totals, too many entries.
fn read_bundle_archive(data: &[u8]) -> Result<BTreeMap<String, Vec<u8>>, FieldTypeError> {
    let mut archive = Archive::new(GzDecoder::new(data));
    let mut files: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    let mut total_decompressed: u64 = 0;

    for entry in archive
        .entries()
        .map_err(|e| FieldTypeError::Rejected(format!("invalid archive: {e}")))?
    {
        let mut entry =
            entry.map_err(|e| FieldTypeError::Rejected(format!("archive read error: {e}")))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry
            .path()
            .map_err(|e| FieldTypeError::Rejected(format!("invalid entry path: {e}")))?
            .into_owned();
        if path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(FieldTypeError::Rejected(format!(
                "entry '{}' escapes the bundle root",
                path.display()
            )));
        }
        let name = path.to_string_lossy().replace('\\', "/");

        if files.len() >= MAX_BUNDLE_FILES {
            return Err(FieldTypeError::Rejected(format!(
                "bundle holds more than {MAX_BUNDLE_FILES} files"
            )));
        }

        let mut buf = Vec::new();
        entry
            .take(MAX_DECOMPRESSED_FILE_SIZE + 1)
            .read_to_end(&mut buf)
            .map_err(|e| FieldTypeError::Rejected(format!("failed to read '{name}': {e}")))?;
        if buf.len() as u64 > MAX_DECOMPRESSED_FILE_SIZE {
            return Err(FieldTypeError::Rejected(format!(
                "file '{name}' exceeds the 16MB decompressed limit"
            )));
        }
        total_decompressed += buf.len() as u64;
        if total_decompressed > MAX_TOTAL_DECOMPRESSED_SIZE {
            return Err(FieldTypeError::Rejected(
                "bundle exceeds the 64MB decompressed limit".into(),
            ));
        }

        files.insert(name, buf);
    }

    if files.is_empty() {
        return Err(FieldTypeError::Rejected("bundle is empty".into()));
    }

    // Tolerate archives built with a single wrapping directory.
    Ok(strip_common_root(files))
}

fn strip_common_root(files: BTreeMap<String, Vec<u8>>) -> BTreeMap<String, Vec<u8>> {
    let roots: std::collections::BTreeSet<&str> = files
        .keys()
        .filter_map(|name| name.split('/').next())
        .collect();
    if roots.len() != 1 || files.keys().any(|name| !name.contains('/')) {
        return files;
    }

    files
        .into_iter()
        .filter_map(|(name, bytes)| {
            name.split_once('/')
                .map(|(_, rest)| (rest.to_string(), bytes))
        })
        .collect()
}
