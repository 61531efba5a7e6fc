use field_core::{FieldTypeRegistry, TypeLoader};
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::config::EngineConfig;

/// Composition root: connect and sync the schema, ensure the composite
/// indexes, build the type registry and discover custom types.
///
/// Discovery is partial-failure tolerant: a broken bundle is logged by the
/// loader and skipped, never fatal to startup.
pub async fn bootstrap(
    config: &EngineConfig,
) -> anyhow::Result<(DatabaseConnection, FieldTypeRegistry)> {
    let db = crate::database::init_db(&config.database.url).await?;
    crate::seed::ensure_indexes(&db).await?;

    let registry = FieldTypeRegistry::with_builtins();
    let report = TypeLoader::new(config.discovery.clone()).load_all_custom_types(&registry);
    info!(
        loaded = report.loaded.len(),
        skipped = report.skipped.len(),
        "Field-type registry ready"
    );

    Ok((db, registry))
}
