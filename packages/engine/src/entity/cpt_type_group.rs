use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// ACF groups attached to a CPT type, in display order.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cpt_type_group")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub type_id: i32,
    #[sea_orm(primary_key)]
    pub group_id: i32,
    #[sea_orm(belongs_to, from = "type_id", to = "id")]
    pub cpt_type: BelongsTo<super::cpt_type::Entity>,
    #[sea_orm(belongs_to, from = "group_id", to = "id")]
    pub group: BelongsTo<super::field_group::Entity>,

    #[sea_orm(default_value = 0)]
    pub position: i32,
}

impl ActiveModelBehavior for ActiveModel {}
