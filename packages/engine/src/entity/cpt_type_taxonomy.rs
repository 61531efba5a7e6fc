use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Taxonomies attached to a CPT type, in display order.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cpt_type_taxonomy")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub type_id: i32,
    #[sea_orm(primary_key)]
    pub taxonomy_id: i32,
    #[sea_orm(belongs_to, from = "type_id", to = "id")]
    pub cpt_type: BelongsTo<super::cpt_type::Entity>,
    #[sea_orm(belongs_to, from = "taxonomy_id", to = "id")]
    pub taxonomy: BelongsTo<super::cpt_taxonomy::Entity>,

    #[sea_orm(default_value = 0)]
    pub position: i32,
}

impl ActiveModelBehavior for ActiveModel {}
