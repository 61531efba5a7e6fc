use chrono::{DateTime, Utc};
use sea_orm::prelude::Uuid;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::field_group;
use crate::models::field::FieldDto;

/// Wire shape of a field group, optionally with its fields attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDto {
    pub id: i32,
    pub uuid: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub location_rules: Value,
    pub placement: Value,
    pub bo_options: Value,
    pub fo_options: Value,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDto>,
    pub date_add: DateTime<Utc>,
    pub date_upd: DateTime<Utc>,
}

impl GroupDto {
    pub fn from_model(m: field_group::Model, fields: Vec<FieldDto>) -> Self {
        Self {
            id: m.id,
            uuid: m.uuid,
            title: m.title,
            slug: m.slug,
            description: m.description,
            location_rules: m.location_rules,
            placement: m.placement,
            bo_options: m.bo_options,
            fo_options: m.fo_options,
            active: m.active,
            fields,
            date_add: m.created_at,
            date_upd: m.updated_at,
        }
    }
}
