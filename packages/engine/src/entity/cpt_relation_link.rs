use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One edge of a typed relation, ordered by `position` on the source side.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cpt_relation_link")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub relation_id: i32,
    #[sea_orm(primary_key)]
    pub source_post_id: i32,
    #[sea_orm(primary_key)]
    pub target_post_id: i32,

    #[sea_orm(belongs_to, from = "relation_id", to = "id")]
    pub relation: BelongsTo<super::cpt_relation::Entity>,
    #[sea_orm(belongs_to, from = "source_post_id", to = "id", relation_enum = "SourcePost")]
    pub source_post: BelongsTo<super::cpt_post::Entity>,
    #[sea_orm(belongs_to, from = "target_post_id", to = "id", relation_enum = "TargetPost")]
    pub target_post: BelongsTo<super::cpt_post::Entity>,

    #[sea_orm(default_value = 0)]
    pub position: i32,
}

impl ActiveModelBehavior for ActiveModel {}
