use chrono::{DateTime, Utc};
use sea_orm::prelude::Uuid;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{field, field_translation};

/// Per-language title/instructions override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTranslationDto {
    pub lang_id: i32,
    pub title: String,
    pub instructions: Option<String>,
}

impl From<field_translation::Model> for FieldTranslationDto {
    fn from(m: field_translation::Model) -> Self {
        Self {
            lang_id: m.lang_id,
            title: m.title,
            instructions: m.instructions,
        }
    }
}

/// Wire shape of a field definition. `children` is present only for
/// repeater-type fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDto {
    pub id: i32,
    pub uuid: Uuid,
    pub group_id: Option<i32>,
    pub parent_id: Option<i32>,
    #[serde(rename = "type")]
    pub field_type: String,
    pub title: String,
    pub slug: String,
    pub instructions: Option<String>,
    pub config: Value,
    pub validation: Value,
    pub conditions: Value,
    pub wrapper: Value,
    pub fo_options: Value,
    pub position: i32,
    pub translatable: bool,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub translations: Vec<FieldTranslationDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FieldDto>>,
    pub date_add: DateTime<Utc>,
    pub date_upd: DateTime<Utc>,
}

impl FieldDto {
    pub fn from_model(
        m: field::Model,
        translations: Vec<field_translation::Model>,
        children: Option<Vec<FieldDto>>,
    ) -> Self {
        Self {
            id: m.id,
            uuid: m.uuid,
            group_id: m.group_id,
            parent_id: m.parent_id,
            field_type: m.field_type,
            title: m.title,
            slug: m.slug,
            instructions: m.instructions,
            config: m.config,
            validation: m.validation,
            conditions: m.conditions,
            wrapper: m.wrapper,
            fo_options: m.fo_options,
            position: m.position,
            translatable: m.translatable,
            active: m.active,
            translations: translations.into_iter().map(Into::into).collect(),
            children,
            date_add: m.created_at,
            date_upd: m.updated_at,
        }
    }
}
