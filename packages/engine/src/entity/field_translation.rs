use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "field_translation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub field_id: i32,
    #[sea_orm(primary_key)]
    pub lang_id: i32,
    #[sea_orm(belongs_to, from = "field_id", to = "id")]
    pub field: BelongsTo<super::field::Entity>,

    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub instructions: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
