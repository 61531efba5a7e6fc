use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cpt_type")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub uuid: Uuid,
    #[sea_orm(unique)]
    pub slug: String,
    pub name: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub config: Json,
    pub url_prefix: String,
    pub has_archive: bool,
    pub archive_slug: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub seo_config: Json,
    pub icon: Option<String>,

    #[sea_orm(default_value = 0)]
    pub position: i32,
    pub active: bool,

    #[sea_orm(has_many)]
    pub posts: HasMany<super::cpt_post::Entity>,

    #[sea_orm(has_many)]
    pub translations: HasMany<super::cpt_type_translation::Entity>,

    #[sea_orm(has_many)]
    pub shops: HasMany<super::cpt_type_shop::Entity>,

    #[sea_orm(has_many, via = "cpt_type_group")]
    pub groups: HasMany<super::field_group::Entity>,

    #[sea_orm(has_many, via = "cpt_type_taxonomy")]
    pub taxonomies: HasMany<super::cpt_taxonomy::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
