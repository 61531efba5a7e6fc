use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "field_value")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub field_id: i32,
    #[sea_orm(belongs_to, from = "field_id", to = "id")]
    pub field: BelongsTo<super::field::Entity>,

    /// Which entity family `entity_id` belongs to ("product", "cpt_post", ...).
    pub entity_type: String,
    pub entity_id: i32,
    pub shop_id: i32,
    /// NULL means shared across languages.
    pub lang_id: Option<i32>,

    /// Stored value; JSON-encoded for non-scalar types.
    #[sea_orm(column_type = "Text")]
    pub value: String,
    /// First 255 characters of `value`, kept in sync on every write so
    /// equality/substring lookups never parse the full payload.
    pub value_index: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
