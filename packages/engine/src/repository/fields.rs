use std::collections::HashMap;

use field_core::FieldTypeRegistry;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use sea_orm::entity::prelude::Json;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{field, field_group, field_translation, field_value};
use crate::error::EngineError;
use crate::models::field::FieldDto;
use crate::models::shared::{
    validate_optional_position, validate_reorder_ids, validate_title,
};
use crate::repository::groups::field_slug_taken;
use crate::slug::resolve_slug;

/// Caller-supplied field payload for `save`.
#[derive(Debug, Clone, Default)]
pub struct FieldInput {
    /// Owning group; NULL for repeater subfields.
    pub group_id: Option<i32>,
    /// Owning repeater field; NULL for top-level fields.
    pub parent_id: Option<i32>,
    pub field_type: String,
    pub title: String,
    pub slug: Option<String>,
    pub instructions: Option<String>,
    pub config: Json,
    pub validation: Json,
    pub conditions: Json,
    pub wrapper: Json,
    pub fo_options: Json,
    pub position: Option<i32>,
    pub translatable: bool,
    pub active: bool,
}

/// A top-level field with its repeater children (empty for other types).
pub struct FieldWithChildren {
    pub field: field::Model,
    pub children: Vec<field::Model>,
}

/// CRUD for field definitions, including the one-level repeater tree.
pub struct FieldRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> FieldRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find(&self, id: i32) -> Result<Option<field::Model>, EngineError> {
        Ok(field::Entity::find_by_id(id).one(self.conn).await?)
    }

    pub async fn get(&self, id: i32) -> Result<field::Model, EngineError> {
        self.find(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Field", id))
    }

    /// Top-level (parent IS NULL), active fields of a group, by position.
    pub async fn find_by_group(&self, group_id: i32) -> Result<Vec<field::Model>, EngineError> {
        Ok(field::Entity::find()
            .filter(field::Column::GroupId.eq(group_id))
            .filter(field::Column::ParentId.is_null())
            .filter(field::Column::Active.eq(true))
            .order_by_asc(field::Column::Position)
            .all(self.conn)
            .await?)
    }

    /// Repeater subfields, same query shape with the parent predicate:
    /// children are ordinary field rows, not a separate entity.
    pub async fn find_by_parent(&self, parent_id: i32) -> Result<Vec<field::Model>, EngineError> {
        Ok(field::Entity::find()
            .filter(field::Column::ParentId.eq(parent_id))
            .filter(field::Column::Active.eq(true))
            .order_by_asc(field::Column::Position)
            .all(self.conn)
            .await?)
    }

    /// Top-level fields with their children attached, one child query for
    /// the whole group.
    pub async fn find_by_group_with_children(
        &self,
        group_id: i32,
    ) -> Result<Vec<FieldWithChildren>, EngineError> {
        let tops = self.find_by_group(group_id).await?;
        if tops.is_empty() {
            return Ok(Vec::new());
        }

        let top_ids: Vec<i32> = tops.iter().map(|f| f.id).collect();
        let children = field::Entity::find()
            .filter(field::Column::ParentId.is_in(top_ids))
            .filter(field::Column::Active.eq(true))
            .order_by_asc(field::Column::Position)
            .all(self.conn)
            .await?;

        let mut by_parent: HashMap<i32, Vec<field::Model>> = HashMap::new();
        for child in children {
            if let Some(parent_id) = child.parent_id {
                by_parent.entry(parent_id).or_default().push(child);
            }
        }

        Ok(tops
            .into_iter()
            .map(|f| {
                let children = by_parent.remove(&f.id).unwrap_or_default();
                FieldWithChildren { field: f, children }
            })
            .collect())
    }

    pub async fn is_slug_taken(
        &self,
        group_id: Option<i32>,
        parent_id: Option<i32>,
        slug: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, EngineError> {
        field_slug_taken(self.conn, group_id, parent_id, slug, exclude_id).await
    }

    /// Insert (no id) or full-row update. The type key must be registered,
    /// ownership must be exactly one of group/parent, and repeater nesting
    /// stops at one level.
    #[instrument(skip(self, registry, input), fields(title = %input.title, field_type = %input.field_type))]
    pub async fn save(
        &self,
        registry: &FieldTypeRegistry,
        input: FieldInput,
        id: Option<i32>,
    ) -> Result<field::Model, EngineError> {
        validate_title(&input.title)?;
        validate_optional_position(input.position)?;

        let field_type = registry.get(&input.field_type).ok_or_else(|| {
            EngineError::Validation(format!("Unknown field type '{}'", input.field_type))
        })?;
        if input.translatable && !field_type.supports_translation() {
            return Err(EngineError::Validation(format!(
                "Field type '{}' does not support per-language values",
                input.field_type
            )));
        }

        match (input.group_id, input.parent_id) {
            (None, None) => {
                return Err(EngineError::Validation(
                    "Field must belong to a group or a parent repeater".into(),
                ));
            }
            (Some(_), Some(_)) => {
                return Err(EngineError::Validation(
                    "Field cannot have both a group and a parent".into(),
                ));
            }
            (Some(group_id), None) => {
                field_group::Entity::find_by_id(group_id)
                    .one(self.conn)
                    .await?
                    .ok_or_else(|| EngineError::not_found("Field group", group_id))?;
            }
            (None, Some(parent_id)) => {
                let parent = self
                    .find(parent_id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("Parent field", parent_id))?;
                if parent.field_type != "repeater" {
                    return Err(EngineError::Validation(
                        "Parent field is not a repeater".into(),
                    ));
                }
                if input.field_type == "repeater" {
                    return Err(EngineError::Validation(
                        "Repeater fields cannot be nested".into(),
                    ));
                }
            }
        }

        let slug = resolve_slug(input.slug.as_deref(), &input.title, "field");
        if self
            .is_slug_taken(input.group_id, input.parent_id, &slug, id)
            .await?
        {
            return Err(EngineError::Conflict(format!(
                "Field slug '{slug}' already exists in this scope"
            )));
        }

        let position = match input.position {
            Some(p) => p,
            None => self.next_position(input.group_id, input.parent_id).await?,
        };

        let now = chrono::Utc::now();
        match id {
            None => {
                let model = field::ActiveModel {
                    uuid: Set(Uuid::new_v4()),
                    group_id: Set(input.group_id),
                    parent_id: Set(input.parent_id),
                    field_type: Set(input.field_type),
                    title: Set(input.title.trim().to_string()),
                    slug: Set(slug),
                    instructions: Set(input.instructions),
                    config: Set(input.config),
                    validation: Set(input.validation),
                    conditions: Set(input.conditions),
                    wrapper: Set(input.wrapper),
                    fo_options: Set(input.fo_options),
                    position: Set(position),
                    translatable: Set(input.translatable),
                    active: Set(input.active),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                Ok(model.insert(self.conn).await?)
            }
            Some(id) => {
                let existing = self.get(id).await?;
                let mut active: field::ActiveModel = existing.into();
                active.group_id = Set(input.group_id);
                active.parent_id = Set(input.parent_id);
                active.field_type = Set(input.field_type);
                active.title = Set(input.title.trim().to_string());
                active.slug = Set(slug);
                active.instructions = Set(input.instructions);
                active.config = Set(input.config);
                active.validation = Set(input.validation);
                active.conditions = Set(input.conditions);
                active.wrapper = Set(input.wrapper);
                active.fo_options = Set(input.fo_options);
                active.position = Set(position);
                active.translatable = Set(input.translatable);
                active.active = Set(input.active);
                active.updated_at = Set(now);
                Ok(active.update(self.conn).await?)
            }
        }
    }

    /// Replace the ordering of a group's top-level fields. The ID array must
    /// contain exactly the fields currently in the group; positions are
    /// assigned by array index.
    #[instrument(skip(self, field_ids))]
    pub async fn reorder(&self, group_id: i32, field_ids: &[i32]) -> Result<(), EngineError> {
        validate_reorder_ids(field_ids, "field id")?;

        let txn = self.conn.begin().await?;

        let existing: Vec<i32> = field::Entity::find()
            .filter(field::Column::GroupId.eq(group_id))
            .filter(field::Column::ParentId.is_null())
            .select_only()
            .column(field::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;

        let existing_set: std::collections::HashSet<i32> = existing.into_iter().collect();
        let payload_set: std::collections::HashSet<i32> = field_ids.iter().copied().collect();
        if existing_set != payload_set {
            return Err(EngineError::Validation(
                "field_ids must contain exactly the fields currently in the group".into(),
            ));
        }

        for (i, &field_id) in field_ids.iter().enumerate() {
            field::Entity::update_many()
                .filter(field::Column::Id.eq(field_id))
                .col_expr(
                    field::Column::Position,
                    Expr::value(i32::try_from(i).map_err(|_| {
                        EngineError::Validation("Too many fields to reorder".into())
                    })?),
                )
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Hard delete a field, its repeater children, and every stored value
    /// and translation of either, in one transaction.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), EngineError> {
        let txn = self.conn.begin().await?;

        field::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| EngineError::not_found("Field", id))?;

        let child_ids: Vec<i32> = field::Entity::find()
            .filter(field::Column::ParentId.eq(id))
            .select_only()
            .column(field::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;

        let mut all_ids = vec![id];
        all_ids.extend(&child_ids);

        field_value::Entity::delete_many()
            .filter(field_value::Column::FieldId.is_in(all_ids.clone()))
            .exec(&txn)
            .await?;
        field_translation::Entity::delete_many()
            .filter(field_translation::Column::FieldId.is_in(all_ids))
            .exec(&txn)
            .await?;
        if !child_ids.is_empty() {
            field::Entity::delete_many()
                .filter(field::Column::Id.is_in(child_ids))
                .exec(&txn)
                .await?;
        }
        field::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    pub async fn upsert_translation(
        &self,
        field_id: i32,
        lang_id: i32,
        title: &str,
        instructions: Option<&str>,
    ) -> Result<(), EngineError> {
        validate_title(title)?;
        self.get(field_id).await?;

        let model = field_translation::ActiveModel {
            field_id: Set(field_id),
            lang_id: Set(lang_id),
            title: Set(title.trim().to_string()),
            instructions: Set(instructions.map(str::to_string)),
        };
        field_translation::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    field_translation::Column::FieldId,
                    field_translation::Column::LangId,
                ])
                .update_columns([
                    field_translation::Column::Title,
                    field_translation::Column::Instructions,
                ])
                .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;
        Ok(())
    }

    pub async fn translations(
        &self,
        field_id: i32,
    ) -> Result<Vec<field_translation::Model>, EngineError> {
        Ok(field_translation::Entity::find()
            .filter(field_translation::Column::FieldId.eq(field_id))
            .order_by_asc(field_translation::Column::LangId)
            .all(self.conn)
            .await?)
    }

    /// Wire DTOs for a group: translations attached, children present only
    /// under repeater fields.
    pub async fn dtos_for_group(&self, group_id: i32) -> Result<Vec<FieldDto>, EngineError> {
        let tree = self.find_by_group_with_children(group_id).await?;

        let mut all_ids: Vec<i32> = Vec::new();
        for entry in &tree {
            all_ids.push(entry.field.id);
            all_ids.extend(entry.children.iter().map(|c| c.id));
        }
        let mut translations: HashMap<i32, Vec<field_translation::Model>> = HashMap::new();
        if !all_ids.is_empty() {
            for t in field_translation::Entity::find()
                .filter(field_translation::Column::FieldId.is_in(all_ids))
                .all(self.conn)
                .await?
            {
                translations.entry(t.field_id).or_default().push(t);
            }
        }

        Ok(tree
            .into_iter()
            .map(|entry| {
                let children = if entry.field.field_type == "repeater" {
                    Some(
                        entry
                            .children
                            .into_iter()
                            .map(|c| {
                                let t = translations.remove(&c.id).unwrap_or_default();
                                FieldDto::from_model(c, t, None)
                            })
                            .collect(),
                    )
                } else {
                    None
                };
                let t = translations.remove(&entry.field.id).unwrap_or_default();
                FieldDto::from_model(entry.field, t, children)
            })
            .collect())
    }

    async fn next_position(
        &self,
        group_id: Option<i32>,
        parent_id: Option<i32>,
    ) -> Result<i32, EngineError> {
        let mut select = field::Entity::find();
        select = match (group_id, parent_id) {
            (_, Some(parent_id)) => select.filter(field::Column::ParentId.eq(parent_id)),
            (Some(group_id), None) => select
                .filter(field::Column::GroupId.eq(group_id))
                .filter(field::Column::ParentId.is_null()),
            (None, None) => select.filter(field::Column::GroupId.is_null()),
        };
        let max_pos: Option<i32> = select
            .select_only()
            .column_as(field::Column::Position.max(), "max_pos")
            .into_tuple::<Option<i32>>()
            .one(self.conn)
            .await?
            .flatten();
        max_pos
            .unwrap_or(-1)
            .checked_add(1)
            .ok_or_else(|| EngineError::Validation("Position overflow".into()))
    }
}
