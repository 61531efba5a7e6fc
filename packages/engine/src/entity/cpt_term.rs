use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cpt_term")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub taxonomy_id: i32,
    #[sea_orm(belongs_to, from = "taxonomy_id", to = "id")]
    pub taxonomy: BelongsTo<super::cpt_taxonomy::Entity>,

    /// Tree parent. Plain column; the tree is loaded with one flat query and
    /// assembled in memory.
    pub parent_id: Option<i32>,

    /// Unique within the owning taxonomy.
    pub slug: String,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(default_value = 0)]
    pub position: i32,
    pub active: bool,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
