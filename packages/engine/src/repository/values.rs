use std::collections::HashMap;

use field_core::{FieldTypeRegistry, RenderOptions, render_raw};
use sea_orm::sea_query::{OnConflict, Query as SeaQuery};
use sea_orm::*;
use sea_orm::entity::prelude::Json;
use tracing::instrument;

use crate::entity::{field, field_value};
use crate::error::EngineError;

pub const ENTITY_PRODUCT: &str = "product";
pub const ENTITY_CPT_POST: &str = "cpt_post";

/// `value_index` column width: values are indexed by their first 255
/// characters only.
const INDEX_LEN: usize = 255;

/// One value write. `lang_id`, `translatable` and `index_value` are
/// resolvable by the store when not supplied.
#[derive(Debug, Clone)]
pub struct ValueWrite {
    pub field_id: i32,
    pub entity_type: String,
    pub entity_id: i32,
    pub shop_id: i32,
    /// Explicit language; None lets the store resolve (the default language
    /// for translatable fields, NULL for non-translatable ones).
    pub lang_id: Option<i32>,
    /// Override; None resolves from the field definition. Translatability is
    /// a property of the field, not the call site.
    pub translatable: Option<bool>,
    /// Override for `value_index`; None derives it from the value.
    pub index_value: Option<String>,
    pub value: Json,
}

impl ValueWrite {
    pub fn new(
        field_id: i32,
        entity_type: impl Into<String>,
        entity_id: i32,
        shop_id: i32,
        value: Json,
    ) -> Self {
        Self {
            field_id,
            entity_type: entity_type.into(),
            entity_id,
            shop_id,
            lang_id: None,
            translatable: None,
            index_value: None,
            value,
        }
    }

    pub fn lang(mut self, lang_id: i32) -> Self {
        self.lang_id = Some(lang_id);
        self
    }
}

/// A loaded value joined with its field definition and display form.
pub struct ValueWithMeta {
    pub field: field::Model,
    pub value: Json,
    pub rendered: String,
}

/// Authoritative persistence for field values across the entity, shop and
/// language dimensions.
///
/// Two write paths, selected by the field's translatable flag:
/// - translatable rows carry a concrete lang_id and go through an atomic
///   upsert on the composite key;
/// - non-translatable rows carry lang_id NULL, which SQL `=` cannot match
///   and unique indexes cannot collapse, so the write is an explicit
///   delete-then-insert wrapped in one transaction.
pub struct ValueStore<'a, C> {
    conn: &'a C,
    default_lang_id: i32,
}

impl<'a, C: ConnectionTrait + TransactionTrait> ValueStore<'a, C> {
    pub fn new(conn: &'a C, default_lang_id: i32) -> Self {
        Self {
            conn,
            default_lang_id,
        }
    }

    #[instrument(skip(self, write), fields(field_id = write.field_id, entity_id = write.entity_id))]
    pub async fn save(&self, write: ValueWrite) -> Result<field_value::Model, EngineError> {
        let translatable = match write.translatable {
            Some(t) => t,
            None => {
                field::Entity::find_by_id(write.field_id)
                    .one(self.conn)
                    .await?
                    .ok_or_else(|| EngineError::not_found("Field", write.field_id))?
                    .translatable
            }
        };

        let encoded = encode_value(&write.value);
        let index = truncate_index(
            &write
                .index_value
                .unwrap_or_else(|| index_form(&write.value)),
        );
        let now = chrono::Utc::now();

        if translatable {
            let lang_id = write.lang_id.unwrap_or(self.default_lang_id);
            let model = field_value::ActiveModel {
                field_id: Set(write.field_id),
                entity_type: Set(write.entity_type),
                entity_id: Set(write.entity_id),
                shop_id: Set(write.shop_id),
                lang_id: Set(Some(lang_id)),
                value: Set(encoded),
                value_index: Set(index),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            // Atomic upsert on the composite key; backed by the unique index
            // from seed::ensure_indexes.
            let model = field_value::Entity::insert(model)
                .on_conflict(
                    OnConflict::columns([
                        field_value::Column::FieldId,
                        field_value::Column::EntityType,
                        field_value::Column::EntityId,
                        field_value::Column::ShopId,
                        field_value::Column::LangId,
                    ])
                    .update_columns([
                        field_value::Column::Value,
                        field_value::Column::ValueIndex,
                        field_value::Column::UpdatedAt,
                    ])
                    .to_owned(),
                )
                .exec_with_returning(self.conn)
                .await?;
            Ok(model)
        } else {
            let txn = self.conn.begin().await?;
            field_value::Entity::delete_many()
                .filter(field_value::Column::FieldId.eq(write.field_id))
                .filter(field_value::Column::EntityType.eq(write.entity_type.as_str()))
                .filter(field_value::Column::EntityId.eq(write.entity_id))
                .filter(field_value::Column::ShopId.eq(write.shop_id))
                .filter(field_value::Column::LangId.is_null())
                .exec(&txn)
                .await?;
            let model = field_value::ActiveModel {
                field_id: Set(write.field_id),
                entity_type: Set(write.entity_type),
                entity_id: Set(write.entity_id),
                shop_id: Set(write.shop_id),
                lang_id: Set(None),
                value: Set(encoded),
                value_index: Set(index),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            let model = model.insert(&txn).await?;
            txn.commit().await?;
            Ok(model)
        }
    }

    /// Latest value per field for (entity, shop, lang-or-shared).
    ///
    /// A field may have both a language-specific row and a shared NULL-lang
    /// row; the most recently inserted one wins, resolved as the maximum
    /// primary key among candidates. This tie-break is part of the store's
    /// contract.
    pub async fn find_for_entity(
        &self,
        entity_type: &str,
        entity_id: i32,
        shop_id: i32,
        lang_id: Option<i32>,
    ) -> Result<Vec<field_value::Model>, EngineError> {
        let latest_per_field = SeaQuery::select()
            .expr(field_value::Column::Id.max())
            .from(field_value::Entity)
            .and_where(field_value::Column::EntityType.eq(entity_type))
            .and_where(field_value::Column::EntityId.eq(entity_id))
            .and_where(field_value::Column::ShopId.eq(shop_id))
            .cond_where(lang_condition(lang_id))
            .group_by_col(field_value::Column::FieldId)
            .to_owned();

        Ok(field_value::Entity::find()
            .filter(field_value::Column::Id.in_subquery(latest_per_field))
            .order_by_asc(field_value::Column::FieldId)
            .all(self.conn)
            .await?)
    }

    /// Values joined with their field definitions and rendered display
    /// forms. Unknown field types fall back to the raw stored value.
    pub async fn find_for_entity_with_meta(
        &self,
        registry: &FieldTypeRegistry,
        entity_type: &str,
        entity_id: i32,
        shop_id: i32,
        lang_id: Option<i32>,
    ) -> Result<Vec<ValueWithMeta>, EngineError> {
        let rows = self
            .find_for_entity(entity_type, entity_id, shop_id, lang_id)
            .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let field_ids: Vec<i32> = rows.iter().map(|r| r.field_id).collect();
        let fields: HashMap<i32, field::Model> = field::Entity::find()
            .filter(field::Column::Id.is_in(field_ids))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|f| (f.id, f))
            .collect();

        let opts = RenderOptions::default();
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(field) = fields.get(&row.field_id).cloned() else {
                continue;
            };
            let value = decode_value(&row.value);
            let rendered = match registry.get(&field.field_type) {
                Some(field_type) => field_type.render(&value, &field.config, &opts),
                None => render_raw(&value),
            };
            out.push(ValueWithMeta {
                field,
                value,
                rendered,
            });
        }
        Ok(out)
    }

    /// Single-field lookup with the same lang-or-shared tie-break.
    pub async fn find_value(
        &self,
        field_id: i32,
        entity_type: &str,
        entity_id: i32,
        shop_id: i32,
        lang_id: Option<i32>,
    ) -> Result<Option<Json>, EngineError> {
        let row = field_value::Entity::find()
            .filter(field_value::Column::FieldId.eq(field_id))
            .filter(field_value::Column::EntityType.eq(entity_type))
            .filter(field_value::Column::EntityId.eq(entity_id))
            .filter(field_value::Column::ShopId.eq(shop_id))
            .filter(lang_condition(lang_id))
            .order_by_desc(field_value::Column::Id)
            .one(self.conn)
            .await?;
        Ok(row.map(|r| decode_value(&r.value)))
    }

    pub async fn delete_by_entity(
        &self,
        entity_type: &str,
        entity_id: i32,
    ) -> Result<u64, EngineError> {
        let res = field_value::Entity::delete_many()
            .filter(field_value::Column::EntityType.eq(entity_type))
            .filter(field_value::Column::EntityId.eq(entity_id))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn delete_by_field(&self, field_id: i32) -> Result<u64, EngineError> {
        let res = field_value::Entity::delete_many()
            .filter(field_value::Column::FieldId.eq(field_id))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn delete_by_field_and_entity(
        &self,
        field_id: i32,
        entity_type: &str,
        entity_id: i32,
    ) -> Result<u64, EngineError> {
        let res = field_value::Entity::delete_many()
            .filter(field_value::Column::FieldId.eq(field_id))
            .filter(field_value::Column::EntityType.eq(entity_type))
            .filter(field_value::Column::EntityId.eq(entity_id))
            .exec(self.conn)
            .await?;
        Ok(res.rows_affected)
    }

    /// Reverse lookup: entity ids holding `value` for a field in a shop.
    /// Equality runs against `value_index`, so it only sees the first 255
    /// characters. That is the point: search never parses full payloads.
    pub async fn find_entities_by_value(
        &self,
        field_id: i32,
        entity_type: &str,
        value: &Json,
        shop_id: i32,
    ) -> Result<Vec<i32>, EngineError> {
        let needle = truncate_index(&index_form(value));
        Ok(field_value::Entity::find()
            .filter(field_value::Column::FieldId.eq(field_id))
            .filter(field_value::Column::EntityType.eq(entity_type))
            .filter(field_value::Column::ShopId.eq(shop_id))
            .filter(field_value::Column::ValueIndex.eq(needle))
            .select_only()
            .column(field_value::Column::EntityId)
            .distinct()
            .into_tuple()
            .all(self.conn)
            .await?)
    }
}

fn lang_condition(lang_id: Option<i32>) -> Condition {
    match lang_id {
        Some(lang) => Condition::any()
            .add(field_value::Column::LangId.eq(lang))
            .add(field_value::Column::LangId.is_null()),
        None => Condition::all().add(field_value::Column::LangId.is_null()),
    }
}

/// Stored form: always JSON, so loads reconstruct the exact value without
/// guessing whether "123" was a text or a number.
pub fn encode_value(value: &Json) -> String {
    value.to_string()
}

pub fn decode_value(raw: &str) -> Json {
    serde_json::from_str(raw).unwrap_or_else(|_| Json::String(raw.to_string()))
}

/// Searchable form: strings verbatim (no JSON quoting), everything else as
/// compact JSON. This is what callers compare against in reverse lookups.
fn index_form(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate_index(s: &str) -> String {
    s.chars().take(INDEX_LEN).collect()
}
