use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cpt_post_term")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub post_id: i32,
    #[sea_orm(primary_key)]
    pub term_id: i32,
    #[sea_orm(belongs_to, from = "post_id", to = "id")]
    pub post: BelongsTo<super::cpt_post::Entity>,
    #[sea_orm(belongs_to, from = "term_id", to = "id")]
    pub term: BelongsTo<super::cpt_term::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
