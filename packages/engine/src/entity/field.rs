use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "field")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub uuid: Uuid,

    /// NULL for repeater subfields, which hang off `parent_id` instead.
    pub group_id: Option<i32>,
    #[sea_orm(belongs_to, from = "group_id", to = "id")]
    pub group: BelongsTo<Option<super::field_group::Entity>>,

    /// Self-referential parent for repeater subfields. Deliberately a plain
    /// column: the tree is traversed with `WHERE parent_id = ?`, not through
    /// an object graph.
    pub parent_id: Option<i32>,

    /// Discriminator into the field-type registry ("text", "select", ...).
    pub field_type: String,

    pub title: String,
    /// Unique within the owning group.
    pub slug: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub instructions: Option<String>,

    /// Type-specific config, owned by the field type.
    #[sea_orm(column_type = "JsonBinary")]
    pub config: Json,
    /// Validation rules, e.g. {"required": true}.
    #[sea_orm(column_type = "JsonBinary")]
    pub validation: Json,
    /// Conditional-display rules.
    #[sea_orm(column_type = "JsonBinary")]
    pub conditions: Json,
    /// Wrapper CSS attributes.
    #[sea_orm(column_type = "JsonBinary")]
    pub wrapper: Json,
    /// Front-office display options.
    #[sea_orm(column_type = "JsonBinary")]
    pub fo_options: Json,

    #[sea_orm(default_value = 0)]
    pub position: i32,
    pub translatable: bool,
    pub active: bool,

    #[sea_orm(has_many)]
    pub translations: HasMany<super::field_translation::Entity>,

    #[sea_orm(has_many)]
    pub values: HasMany<super::field_value::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
