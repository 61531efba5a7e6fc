use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::post_status::PostStatus;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cpt_post")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub uuid: Uuid,

    pub type_id: i32,
    #[sea_orm(belongs_to, from = "type_id", to = "id")]
    pub cpt_type: BelongsTo<super::cpt_type::Entity>,

    /// Unique within the owning type, not globally.
    pub slug: String,
    pub title: String,
    pub status: PostStatus,

    pub employee_id: Option<i32>,

    pub seo_title: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub seo_description: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub seo_meta: Json,

    #[sea_orm(has_many)]
    pub translations: HasMany<super::cpt_post_translation::Entity>,

    #[sea_orm(has_many)]
    pub shops: HasMany<super::cpt_post_shop::Entity>,

    #[sea_orm(has_many, via = "cpt_post_term")]
    pub terms: HasMany<super::cpt_term::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
