use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use sea_orm::entity::prelude::Json;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{
    cpt_post, cpt_relation, cpt_type, cpt_type_group, cpt_type_shop, cpt_type_taxonomy,
    cpt_type_translation, field_group,
};
use crate::error::EngineError;
use crate::models::shared::validate_title;
use crate::slug::resolve_slug;

/// Caller-supplied CPT type payload for `save`.
#[derive(Debug, Clone, Default)]
pub struct CptTypeInput {
    pub slug: Option<String>,
    pub name: String,
    pub config: Json,
    pub url_prefix: String,
    pub has_archive: bool,
    pub archive_slug: Option<String>,
    pub seo_config: Json,
    pub icon: Option<String>,
    pub position: Option<i32>,
    pub active: bool,
}

/// CRUD for CPT types plus their ordered attachments (ACF groups,
/// taxonomies, shops) and per-language translations.
pub struct CptTypeRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> CptTypeRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find(&self, id: i32) -> Result<Option<cpt_type::Model>, EngineError> {
        Ok(cpt_type::Entity::find_by_id(id).one(self.conn).await?)
    }

    pub async fn get(&self, id: i32) -> Result<cpt_type::Model, EngineError> {
        self.find(id)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT type", id))
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<cpt_type::Model>, EngineError> {
        Ok(cpt_type::Entity::find()
            .filter(cpt_type::Column::Slug.eq(slug))
            .one(self.conn)
            .await?)
    }

    pub async fn list(&self, active_only: bool) -> Result<Vec<cpt_type::Model>, EngineError> {
        let mut select = cpt_type::Entity::find();
        if active_only {
            select = select.filter(cpt_type::Column::Active.eq(true));
        }
        Ok(select
            .order_by_asc(cpt_type::Column::Position)
            .order_by_asc(cpt_type::Column::Id)
            .all(self.conn)
            .await?)
    }

    pub async fn is_slug_taken(
        &self,
        slug: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, EngineError> {
        let mut select = cpt_type::Entity::find().filter(cpt_type::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            select = select.filter(cpt_type::Column::Id.ne(id));
        }
        Ok(select.count(self.conn).await? > 0)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn save(
        &self,
        input: CptTypeInput,
        id: Option<i32>,
    ) -> Result<cpt_type::Model, EngineError> {
        validate_title(&input.name)?;
        let slug = resolve_slug(input.slug.as_deref(), &input.name, "cpt");
        if self.is_slug_taken(&slug, id).await? {
            return Err(EngineError::Conflict(format!(
                "CPT type slug '{slug}' already exists"
            )));
        }

        let position = match input.position {
            Some(p) => p,
            None => next_type_position(self.conn).await?,
        };

        let now = chrono::Utc::now();
        match id {
            None => {
                let model = cpt_type::ActiveModel {
                    uuid: Set(Uuid::new_v4()),
                    slug: Set(slug),
                    name: Set(input.name.trim().to_string()),
                    config: Set(input.config),
                    url_prefix: Set(input.url_prefix),
                    has_archive: Set(input.has_archive),
                    archive_slug: Set(input.archive_slug),
                    seo_config: Set(input.seo_config),
                    icon: Set(input.icon),
                    position: Set(position),
                    active: Set(input.active),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                Ok(model.insert(self.conn).await?)
            }
            Some(id) => {
                let existing = self.get(id).await?;
                let mut active: cpt_type::ActiveModel = existing.into();
                active.slug = Set(slug);
                active.name = Set(input.name.trim().to_string());
                active.config = Set(input.config);
                active.url_prefix = Set(input.url_prefix);
                active.has_archive = Set(input.has_archive);
                active.archive_slug = Set(input.archive_slug);
                active.seo_config = Set(input.seo_config);
                active.icon = Set(input.icon);
                active.position = Set(position);
                active.active = Set(input.active);
                active.updated_at = Set(now);
                Ok(active.update(self.conn).await?)
            }
        }
    }

    /// Hard delete. Refused while posts or relation definitions still point
    /// at the type; attachments and translations are cleaned up in the same
    /// transaction.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), EngineError> {
        let txn = self.conn.begin().await?;

        cpt_type::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT type", id))?;

        let post_count = cpt_post::Entity::find()
            .filter(cpt_post::Column::TypeId.eq(id))
            .count(&txn)
            .await?;
        if post_count > 0 {
            return Err(EngineError::Conflict(
                "Cannot delete CPT type with existing posts".into(),
            ));
        }

        let relation_count = cpt_relation::Entity::find()
            .filter(
                Condition::any()
                    .add(cpt_relation::Column::SourceTypeId.eq(id))
                    .add(cpt_relation::Column::TargetTypeId.eq(id)),
            )
            .count(&txn)
            .await?;
        if relation_count > 0 {
            return Err(EngineError::Conflict(
                "Cannot delete CPT type referenced by a relation".into(),
            ));
        }

        cpt_type_translation::Entity::delete_many()
            .filter(cpt_type_translation::Column::TypeId.eq(id))
            .exec(&txn)
            .await?;
        cpt_type_shop::Entity::delete_many()
            .filter(cpt_type_shop::Column::TypeId.eq(id))
            .exec(&txn)
            .await?;
        cpt_type_group::Entity::delete_many()
            .filter(cpt_type_group::Column::TypeId.eq(id))
            .exec(&txn)
            .await?;
        cpt_type_taxonomy::Entity::delete_many()
            .filter(cpt_type_taxonomy::Column::TypeId.eq(id))
            .exec(&txn)
            .await?;
        cpt_type::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Replace the ordered set of ACF groups attached to a type.
    #[instrument(skip(self, group_ids))]
    pub async fn sync_groups(&self, type_id: i32, group_ids: &[i32]) -> Result<(), EngineError> {
        let txn = self.conn.begin().await?;
        cpt_type::Entity::find_by_id(type_id)
            .one(&txn)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT type", type_id))?;

        for &group_id in group_ids {
            field_group::Entity::find_by_id(group_id)
                .one(&txn)
                .await?
                .ok_or_else(|| EngineError::not_found("Field group", group_id))?;
        }

        cpt_type_group::Entity::delete_many()
            .filter(cpt_type_group::Column::TypeId.eq(type_id))
            .exec(&txn)
            .await?;
        for (i, &group_id) in group_ids.iter().enumerate() {
            let link = cpt_type_group::ActiveModel {
                type_id: Set(type_id),
                group_id: Set(group_id),
                position: Set(i as i32),
            };
            link.insert(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// ACF groups attached to a type, in attachment order.
    pub async fn groups(&self, type_id: i32) -> Result<Vec<field_group::Model>, EngineError> {
        let links = cpt_type_group::Entity::find()
            .filter(cpt_type_group::Column::TypeId.eq(type_id))
            .order_by_asc(cpt_type_group::Column::Position)
            .all(self.conn)
            .await?;
        ordered_by_link(self.conn, links.iter().map(|l| l.group_id).collect()).await
    }

    /// Replace the ordered set of taxonomies attached to a type.
    #[instrument(skip(self, taxonomy_ids))]
    pub async fn sync_taxonomies(
        &self,
        type_id: i32,
        taxonomy_ids: &[i32],
    ) -> Result<(), EngineError> {
        let txn = self.conn.begin().await?;
        cpt_type::Entity::find_by_id(type_id)
            .one(&txn)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT type", type_id))?;

        cpt_type_taxonomy::Entity::delete_many()
            .filter(cpt_type_taxonomy::Column::TypeId.eq(type_id))
            .exec(&txn)
            .await?;
        for (i, &taxonomy_id) in taxonomy_ids.iter().enumerate() {
            let link = cpt_type_taxonomy::ActiveModel {
                type_id: Set(type_id),
                taxonomy_id: Set(taxonomy_id),
                position: Set(i as i32),
            };
            link.insert(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Replace the shops a type is visible in.
    #[instrument(skip(self, shop_ids))]
    pub async fn sync_shops(&self, type_id: i32, shop_ids: &[i32]) -> Result<(), EngineError> {
        let txn = self.conn.begin().await?;
        cpt_type::Entity::find_by_id(type_id)
            .one(&txn)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT type", type_id))?;

        cpt_type_shop::Entity::delete_many()
            .filter(cpt_type_shop::Column::TypeId.eq(type_id))
            .exec(&txn)
            .await?;
        for &shop_id in shop_ids {
            let link = cpt_type_shop::ActiveModel {
                type_id: Set(type_id),
                shop_id: Set(shop_id),
            };
            link.insert(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    pub async fn upsert_translation(
        &self,
        type_id: i32,
        lang_id: i32,
        name: &str,
        description: Option<&str>,
    ) -> Result<(), EngineError> {
        validate_title(name)?;
        self.get(type_id).await?;

        let model = cpt_type_translation::ActiveModel {
            type_id: Set(type_id),
            lang_id: Set(lang_id),
            name: Set(name.trim().to_string()),
            description: Set(description.map(str::to_string)),
        };
        cpt_type_translation::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    cpt_type_translation::Column::TypeId,
                    cpt_type_translation::Column::LangId,
                ])
                .update_columns([
                    cpt_type_translation::Column::Name,
                    cpt_type_translation::Column::Description,
                ])
                .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;
        Ok(())
    }
}

async fn next_type_position<C: ConnectionTrait>(conn: &C) -> Result<i32, EngineError> {
    let max_pos: Option<i32> = cpt_type::Entity::find()
        .select_only()
        .column_as(cpt_type::Column::Position.max(), "max_pos")
        .into_tuple::<Option<i32>>()
        .one(conn)
        .await?
        .flatten();
    max_pos
        .unwrap_or(-1)
        .checked_add(1)
        .ok_or_else(|| EngineError::Validation("Position overflow".into()))
}

/// Load groups by id preserving the link order. A dangling link id is
/// silently dropped rather than failing the lookup.
async fn ordered_by_link<C: ConnectionTrait>(
    conn: &C,
    ordered_ids: Vec<i32>,
) -> Result<Vec<field_group::Model>, EngineError> {
    if ordered_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut by_id: std::collections::HashMap<i32, field_group::Model> = field_group::Entity::find()
        .filter(field_group::Column::Id.is_in(ordered_ids.clone()))
        .all(conn)
        .await?
        .into_iter()
        .map(|g| (g.id, g))
        .collect();
    Ok(ordered_ids
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .collect())
}
