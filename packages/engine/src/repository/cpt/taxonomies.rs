use sea_orm::*;
use sea_orm::entity::prelude::Json;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{cpt_post_term, cpt_taxonomy, cpt_term, cpt_type_taxonomy};
use crate::error::EngineError;
use crate::models::shared::validate_title;
use crate::slug::resolve_slug;

/// Caller-supplied taxonomy payload for `save`.
#[derive(Debug, Clone, Default)]
pub struct CptTaxonomyInput {
    pub slug: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub hierarchical: bool,
    pub config: Json,
    pub active: bool,
}

pub struct CptTaxonomyRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> CptTaxonomyRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find(&self, id: i32) -> Result<Option<cpt_taxonomy::Model>, EngineError> {
        Ok(cpt_taxonomy::Entity::find_by_id(id).one(self.conn).await?)
    }

    pub async fn get(&self, id: i32) -> Result<cpt_taxonomy::Model, EngineError> {
        self.find(id)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT taxonomy", id))
    }

    pub async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<cpt_taxonomy::Model>, EngineError> {
        Ok(cpt_taxonomy::Entity::find()
            .filter(cpt_taxonomy::Column::Slug.eq(slug))
            .one(self.conn)
            .await?)
    }

    pub async fn list(&self, active_only: bool) -> Result<Vec<cpt_taxonomy::Model>, EngineError> {
        let mut select = cpt_taxonomy::Entity::find();
        if active_only {
            select = select.filter(cpt_taxonomy::Column::Active.eq(true));
        }
        Ok(select
            .order_by_asc(cpt_taxonomy::Column::Id)
            .all(self.conn)
            .await?)
    }

    pub async fn is_slug_taken(
        &self,
        slug: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, EngineError> {
        let mut select = cpt_taxonomy::Entity::find().filter(cpt_taxonomy::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            select = select.filter(cpt_taxonomy::Column::Id.ne(id));
        }
        Ok(select.count(self.conn).await? > 0)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn save(
        &self,
        input: CptTaxonomyInput,
        id: Option<i32>,
    ) -> Result<cpt_taxonomy::Model, EngineError> {
        validate_title(&input.name)?;
        let slug = resolve_slug(input.slug.as_deref(), &input.name, "taxonomy");
        if self.is_slug_taken(&slug, id).await? {
            return Err(EngineError::Conflict(format!(
                "Taxonomy slug '{slug}' already exists"
            )));
        }

        let now = chrono::Utc::now();
        match id {
            None => {
                let model = cpt_taxonomy::ActiveModel {
                    uuid: Set(Uuid::new_v4()),
                    slug: Set(slug),
                    name: Set(input.name.trim().to_string()),
                    description: Set(input.description),
                    hierarchical: Set(input.hierarchical),
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
                let mut active: cpt_taxonomy::ActiveModel = existing.into();
                active.slug = Set(slug);
                active.name = Set(input.name.trim().to_string());
                active.description = Set(input.description);
                active.hierarchical = Set(input.hierarchical);
                active.config = Set(input.config);
                active.active = Set(input.active);
                active.updated_at = Set(now);
                Ok(active.update(self.conn).await?)
            }
        }
    }

    /// Hard delete: post-term links of its terms, the terms themselves, and
    /// type attachments all go in one transaction.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), EngineError> {
        let txn = self.conn.begin().await?;

        cpt_taxonomy::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT taxonomy", id))?;

        let term_ids: Vec<i32> = cpt_term::Entity::find()
            .filter(cpt_term::Column::TaxonomyId.eq(id))
            .select_only()
            .column(cpt_term::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;

        if !term_ids.is_empty() {
            cpt_post_term::Entity::delete_many()
                .filter(cpt_post_term::Column::TermId.is_in(term_ids))
                .exec(&txn)
                .await?;
            cpt_term::Entity::delete_many()
                .filter(cpt_term::Column::TaxonomyId.eq(id))
                .exec(&txn)
                .await?;
        }
        cpt_type_taxonomy::Entity::delete_many()
            .filter(cpt_type_taxonomy::Column::TaxonomyId.eq(id))
            .exec(&txn)
            .await?;
        cpt_taxonomy::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }
}
