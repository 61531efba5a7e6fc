use sea_orm::sea_query::{
    Index, IndexCreateStatement, MysqlQueryBuilder, PostgresQueryBuilder, SqliteQueryBuilder,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, DbErr};
use tracing::info;

use crate::entity::{cpt_post, cpt_term, field, field_value};

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite indexes, so we create them
/// manually on startup. The unique index on the value scope is load-bearing:
/// the translatable-value upsert conflicts on it.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let statements: Vec<(&str, IndexCreateStatement)> = vec![
        (
            "uq_field_value_scope",
            Index::create()
                .if_not_exists()
                .name("uq_field_value_scope")
                .table(field_value::Entity)
                .col(field_value::Column::FieldId)
                .col(field_value::Column::EntityType)
                .col(field_value::Column::EntityId)
                .col(field_value::Column::ShopId)
                .col(field_value::Column::LangId)
                .unique()
                .to_owned(),
        ),
        (
            // Entity page loads: all values of one entity in one shop.
            "idx_field_value_entity",
            Index::create()
                .if_not_exists()
                .name("idx_field_value_entity")
                .table(field_value::Entity)
                .col(field_value::Column::EntityType)
                .col(field_value::Column::EntityId)
                .col(field_value::Column::ShopId)
                .to_owned(),
        ),
        (
            // Reverse lookup: entities by value_index equality.
            "idx_field_value_search",
            Index::create()
                .if_not_exists()
                .name("idx_field_value_search")
                .table(field_value::Entity)
                .col(field_value::Column::FieldId)
                .col(field_value::Column::ValueIndex)
                .to_owned(),
        ),
        (
            // Repeater child traversal.
            "idx_field_parent",
            Index::create()
                .if_not_exists()
                .name("idx_field_parent")
                .table(field::Entity)
                .col(field::Column::ParentId)
                .to_owned(),
        ),
        (
            // Post slugs are unique per type, not globally.
            "uq_cpt_post_type_slug",
            Index::create()
                .if_not_exists()
                .name("uq_cpt_post_type_slug")
                .table(cpt_post::Entity)
                .col(cpt_post::Column::TypeId)
                .col(cpt_post::Column::Slug)
                .unique()
                .to_owned(),
        ),
        (
            // Term slugs are unique per taxonomy.
            "uq_cpt_term_taxonomy_slug",
            Index::create()
                .if_not_exists()
                .name("uq_cpt_term_taxonomy_slug")
                .table(cpt_term::Entity)
                .col(cpt_term::Column::TaxonomyId)
                .col(cpt_term::Column::Slug)
                .unique()
                .to_owned(),
        ),
    ];

    let backend = db.get_database_backend();
    for (name, stmt) in statements {
        let sql = match backend {
            DbBackend::Postgres => stmt.to_string(PostgresQueryBuilder),
            DbBackend::MySql => stmt.to_string(MysqlQueryBuilder),
            DbBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
            _ => unreachable!("unsupported database backend"),
        };
        match db.execute_unprepared(&sql).await {
            Ok(_) => {
                info!("Ensured index {name} exists");
            }
            Err(e) => {
                tracing::warn!("Failed to create index {name}: {e}");
            }
        }
    }

    Ok(())
}
