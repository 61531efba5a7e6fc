use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cpt_type_translation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub type_id: i32,
    #[sea_orm(primary_key)]
    pub lang_id: i32,
    #[sea_orm(belongs_to, from = "type_id", to = "id")]
    pub cpt_type: BelongsTo<super::cpt_type::Entity>,

    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
