//! Export/import of field groups as version-control-friendly JSON, for
//! shipping group definitions with a theme.

use std::fs;
use std::path::Path;

use field_core::FieldTypeRegistry;
use sea_orm::*;
use sea_orm::entity::prelude::Json;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::entity::field;
use crate::error::EngineError;
use crate::repository::fields::{FieldInput, FieldRepository};
use crate::repository::groups::{FieldGroupRepository, GroupInput};

fn default_true() -> bool {
    true
}

/// Theme-distributable form of one field definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldExport {
    #[serde(rename = "type")]
    pub field_type: String,
    pub title: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default)]
    pub config: Json,
    #[serde(default)]
    pub validation: Json,
    #[serde(default)]
    pub conditions: Json,
    #[serde(default)]
    pub wrapper: Json,
    #[serde(default)]
    pub fo_options: Json,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub translatable: bool,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FieldExport>,
}

/// Theme-distributable form of one group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupExport {
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub location_rules: Json,
    #[serde(default)]
    pub placement: Json,
    #[serde(default)]
    pub bo_options: Json,
    #[serde(default)]
    pub fo_options: Json,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub fields: Vec<FieldExport>,
}

/// What to do when an imported group's slug already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Keep the existing group, add only new ones.
    Merge,
    /// Drop the existing group (fields and values included) and recreate it
    /// from the file.
    Replace,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub created: Vec<String>,
    pub replaced: Vec<String>,
    /// (group slug or group/field slug, reason)
    pub skipped: Vec<(String, String)>,
}

pub struct SyncService<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> SyncService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn export_group(&self, slug: &str) -> Result<GroupExport, EngineError> {
        let groups = FieldGroupRepository::new(self.conn);
        let group = groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| EngineError::not_found("Field group", slug))?;

        let tree = FieldRepository::new(self.conn)
            .find_by_group_with_children(group.id)
            .await?;
        let fields = tree
            .into_iter()
            .map(|entry| {
                let children = entry.children.iter().map(export_field_flat).collect();
                let mut export = export_field_flat(&entry.field);
                export.children = children;
                export
            })
            .collect();

        Ok(GroupExport {
            slug: group.slug,
            title: group.title,
            description: group.description,
            location_rules: group.location_rules,
            placement: group.placement,
            bo_options: group.bo_options,
            fo_options: group.fo_options,
            active: group.active,
            fields,
        })
    }

    pub async fn export_all(&self) -> Result<Vec<GroupExport>, EngineError> {
        let slugs: Vec<String> = crate::entity::field_group::Entity::find()
            .order_by_asc(crate::entity::field_group::Column::Slug)
            .select_only()
            .column(crate::entity::field_group::Column::Slug)
            .into_tuple()
            .all(self.conn)
            .await?;

        let mut exports = Vec::with_capacity(slugs.len());
        for slug in slugs {
            exports.push(self.export_group(&slug).await?);
        }
        Ok(exports)
    }

    /// Import one group. Fields whose type is not registered are reported
    /// per-slug and skipped; they never fail the whole file.
    #[instrument(skip(self, registry, export), fields(slug = %export.slug))]
    pub async fn import_group(
        &self,
        registry: &FieldTypeRegistry,
        export: GroupExport,
        mode: ImportMode,
        report: &mut ImportReport,
    ) -> Result<(), EngineError> {
        let groups = FieldGroupRepository::new(self.conn);
        let existing = groups.find_by_slug(&export.slug).await?;

        let replacing = match (existing, mode) {
            (Some(_), ImportMode::Merge) => {
                report
                    .skipped
                    .push((export.slug.clone(), "already exists".into()));
                return Ok(());
            }
            (Some(existing), ImportMode::Replace) => {
                groups.delete(existing.id).await?;
                true
            }
            (None, _) => false,
        };

        let group = groups
            .save(
                GroupInput {
                    title: export.title,
                    slug: Some(export.slug.clone()),
                    description: export.description,
                    location_rules: export.location_rules,
                    placement: export.placement,
                    bo_options: export.bo_options,
                    fo_options: export.fo_options,
                    active: export.active,
                },
                None,
            )
            .await?;

        let fields = FieldRepository::new(self.conn);
        for field_export in export.fields {
            let children = field_export.children.clone();
            let slug = field_export.slug.clone();
            match fields
                .save(registry, import_input(field_export, Some(group.id), None), None)
                .await
            {
                Ok(parent) => {
                    for child in children {
                        let child_slug = format!("{slug}/{}", child.slug);
                        if let Err(e) = fields
                            .save(registry, import_input(child, None, Some(parent.id)), None)
                            .await
                        {
                            warn!("Skipping imported field '{child_slug}': {e}");
                            report.skipped.push((child_slug, e.to_string()));
                        }
                    }
                }
                Err(e) => {
                    warn!("Skipping imported field '{slug}': {e}");
                    report.skipped.push((slug, e.to_string()));
                }
            }
        }

        if replacing {
            report.replaced.push(group.slug);
        } else {
            report.created.push(group.slug);
        }
        Ok(())
    }

    pub async fn import_groups(
        &self,
        registry: &FieldTypeRegistry,
        exports: Vec<GroupExport>,
        mode: ImportMode,
    ) -> Result<ImportReport, EngineError> {
        let mut report = ImportReport::default();
        for export in exports {
            self.import_group(registry, export, mode, &mut report)
                .await?;
        }
        Ok(report)
    }

    /// Write every group as `<slug>.json` under `dir`. Returns the number of
    /// files written.
    pub async fn write_dir(&self, dir: &Path) -> Result<usize, EngineError> {
        let exports = self.export_all().await?;
        fs::create_dir_all(dir)?;
        for export in &exports {
            let path = dir.join(format!("{}.json", export.slug));
            fs::write(&path, serde_json::to_vec_pretty(export)?)?;
        }
        Ok(exports.len())
    }

    /// Read every `*.json` group file under `dir` and import it. Malformed
    /// files are skipped with a warning, matching the discovery loader's
    /// partial-failure tolerance.
    pub async fn import_dir(
        &self,
        registry: &FieldTypeRegistry,
        dir: &Path,
        mode: ImportMode,
    ) -> Result<ImportReport, EngineError> {
        let mut exports = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(EngineError::from)
                .and_then(|raw| Ok(serde_json::from_str::<GroupExport>(&raw)?))
            {
                Ok(export) => exports.push(export),
                Err(e) => warn!("Skipping group file {}: {e}", path.display()),
            }
        }
        exports.sort_by(|a, b| a.slug.cmp(&b.slug));
        self.import_groups(registry, exports, mode).await
    }
}

fn export_field_flat(f: &field::Model) -> FieldExport {
    FieldExport {
        field_type: f.field_type.clone(),
        title: f.title.clone(),
        slug: f.slug.clone(),
        instructions: f.instructions.clone(),
        config: f.config.clone(),
        validation: f.validation.clone(),
        conditions: f.conditions.clone(),
        wrapper: f.wrapper.clone(),
        fo_options: f.fo_options.clone(),
        position: f.position,
        translatable: f.translatable,
        active: f.active,
        children: Vec::new(),
    }
}

fn import_input(
    export: FieldExport,
    group_id: Option<i32>,
    parent_id: Option<i32>,
) -> FieldInput {
    FieldInput {
        group_id,
        parent_id,
        field_type: export.field_type,
        title: export.title,
        slug: Some(export.slug),
        instructions: export.instructions,
        config: export.config,
        validation: export.validation,
        conditions: export.conditions,
        wrapper: export.wrapper,
        fo_options: export.fo_options,
        position: Some(export.position),
        translatable: export.translatable,
        active: export.active,
    }
}
