use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "field_group")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub uuid: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Boolean rule tree gating where this group applies. Stored verbatim;
    /// parsed by the location evaluator.
    #[sea_orm(column_type = "JsonBinary")]
    pub location_rules: Json,
    /// Tab/position/priority display placement.
    #[sea_orm(column_type = "JsonBinary")]
    pub placement: Json,
    /// Back-office display options (scope, collapse state, ...).
    #[sea_orm(column_type = "JsonBinary")]
    pub bo_options: Json,
    /// Front-office display options.
    #[sea_orm(column_type = "JsonBinary")]
    pub fo_options: Json,

    pub active: bool,

    #[sea_orm(has_many)]
    pub fields: HasMany<super::field::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
