use std::collections::HashMap;

use sea_orm::*;
use sea_orm::entity::prelude::Json;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{cpt_post, cpt_relation, cpt_relation_link, cpt_type};
use crate::error::EngineError;
use crate::models::shared::validate_title;
use crate::slug::resolve_slug;

/// Caller-supplied relation payload for `save`.
#[derive(Debug, Clone, Default)]
pub struct CptRelationInput {
    pub slug: Option<String>,
    pub name: String,
    pub source_type_id: i32,
    pub target_type_id: i32,
    pub config: Json,
    pub active: bool,
}

/// Typed, directed many-to-many edges between CPT posts. The relation row
/// defines the edge type; actual edges are ordered link rows.
pub struct CptRelationRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> CptRelationRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find(&self, id: i32) -> Result<Option<cpt_relation::Model>, EngineError> {
        Ok(cpt_relation::Entity::find_by_id(id).one(self.conn).await?)
    }

    pub async fn get(&self, id: i32) -> Result<cpt_relation::Model, EngineError> {
        self.find(id)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT relation", id))
    }

    pub async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<cpt_relation::Model>, EngineError> {
        Ok(cpt_relation::Entity::find()
            .filter(cpt_relation::Column::Slug.eq(slug))
            .one(self.conn)
            .await?)
    }

    pub async fn is_slug_taken(
        &self,
        slug: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, EngineError> {
        let mut select = cpt_relation::Entity::find().filter(cpt_relation::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            select = select.filter(cpt_relation::Column::Id.ne(id));
        }
        Ok(select.count(self.conn).await? > 0)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn save(
        &self,
        input: CptRelationInput,
        id: Option<i32>,
    ) -> Result<cpt_relation::Model, EngineError> {
        validate_title(&input.name)?;
        for type_id in [input.source_type_id, input.target_type_id] {
            cpt_type::Entity::find_by_id(type_id)
                .one(self.conn)
                .await?
                .ok_or_else(|| EngineError::not_found("CPT type", type_id))?;
        }

        let slug = resolve_slug(input.slug.as_deref(), &input.name, "relation");
        if self.is_slug_taken(&slug, id).await? {
            return Err(EngineError::Conflict(format!(
                "Relation slug '{slug}' already exists"
            )));
        }

        let now = chrono::Utc::now();
        match id {
            None => {
                let model = cpt_relation::ActiveModel {
                    uuid: Set(Uuid::new_v4()),
                    slug: Set(slug),
                    name: Set(input.name.trim().to_string()),
                    source_type_id: Set(input.source_type_id),
                    target_type_id: Set(input.target_type_id),
                    config: Set(input.config),
                    active: Set(input.active),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                Ok(model.insert(self.conn).await?)
            }
            Some(id) => {
                let existing = self.get(id).await?;
                let mut active: cpt_relation::ActiveModel = existing.into();
                active.slug = Set(slug);
                active.name = Set(input.name.trim().to_string());
                active.source_type_id = Set(input.source_type_id);
                active.target_type_id = Set(input.target_type_id);
                active.config = Set(input.config);
                active.active = Set(input.active);
                active.updated_at = Set(now);
                Ok(active.update(self.conn).await?)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), EngineError> {
        let txn = self.conn.begin().await?;

        cpt_relation::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT relation", id))?;

        cpt_relation_link::Entity::delete_many()
            .filter(cpt_relation_link::Column::RelationId.eq(id))
            .exec(&txn)
            .await?;
        cpt_relation::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Replace the full ordered edge set for (relation, source) atomically.
    /// Source and targets are validated against the relation's declared
    /// types before anything is touched.
    #[instrument(skip(self, target_ids))]
    pub async fn sync_related(
        &self,
        relation_id: i32,
        source_post_id: i32,
        target_ids: &[i32],
    ) -> Result<(), EngineError> {
        let txn = self.conn.begin().await?;

        let relation = cpt_relation::Entity::find_by_id(relation_id)
            .one(&txn)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT relation", relation_id))?;

        let source = cpt_post::Entity::find_by_id(source_post_id)
            .one(&txn)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT post", source_post_id))?;
        if source.type_id != relation.source_type_id {
            return Err(EngineError::Validation(format!(
                "Post {source_post_id} is not of the relation's source type"
            )));
        }

        for &target_id in target_ids {
            let target = cpt_post::Entity::find_by_id(target_id)
                .one(&txn)
                .await?
                .ok_or_else(|| EngineError::not_found("CPT post", target_id))?;
            if target.type_id != relation.target_type_id {
                return Err(EngineError::Validation(format!(
                    "Post {target_id} is not of the relation's target type"
                )));
            }
        }

        cpt_relation_link::Entity::delete_many()
            .filter(cpt_relation_link::Column::RelationId.eq(relation_id))
            .filter(cpt_relation_link::Column::SourcePostId.eq(source_post_id))
            .exec(&txn)
            .await?;
        for (i, &target_id) in target_ids.iter().enumerate() {
            let link = cpt_relation_link::ActiveModel {
                relation_id: Set(relation_id),
                source_post_id: Set(source_post_id),
                target_post_id: Set(target_id),
                position: Set(i as i32),
            };
            link.insert(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Target posts of (relation, source), in edge order.
    pub async fn related(
        &self,
        relation_id: i32,
        source_post_id: i32,
    ) -> Result<Vec<cpt_post::Model>, EngineError> {
        let links = cpt_relation_link::Entity::find()
            .filter(cpt_relation_link::Column::RelationId.eq(relation_id))
            .filter(cpt_relation_link::Column::SourcePostId.eq(source_post_id))
            .order_by_asc(cpt_relation_link::Column::Position)
            .all(self.conn)
            .await?;
        if links.is_empty() {
            return Ok(Vec::new());
        }

        let target_ids: Vec<i32> = links.iter().map(|l| l.target_post_id).collect();
        let mut by_id: HashMap<i32, cpt_post::Model> = cpt_post::Entity::find()
            .filter(cpt_post::Column::Id.is_in(target_ids.clone()))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(target_ids
            .into_iter()
            .filter_map(|id| by_id.remove(&id))
            .collect())
    }
}
