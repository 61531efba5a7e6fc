use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named, directed many-to-many edge type between two CPT types
/// (e.g. "Author ↔ Book"). Actual edges live in `cpt_relation_link`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cpt_relation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub uuid: Uuid,
    #[sea_orm(unique)]
    pub slug: String,
    pub name: String,

    pub source_type_id: i32,
    #[sea_orm(belongs_to, from = "source_type_id", to = "id", relation_enum = "SourceType")]
    pub source_type: BelongsTo<super::cpt_type::Entity>,

    pub target_type_id: i32,
    #[sea_orm(belongs_to, from = "target_type_id", to = "id", relation_enum = "TargetType")]
    pub target_type: BelongsTo<super::cpt_type::Entity>,

    #[sea_orm(column_type = "JsonBinary")]
    pub config: Json,
    pub active: bool,

    #[sea_orm(has_many)]
    pub links: HasMany<super::cpt_relation_link::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
