use std::str::FromStr;

use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use sea_orm::entity::prelude::Json;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{
    cpt_post, cpt_post_shop, cpt_post_term, cpt_post_translation, cpt_relation_link, cpt_term,
    cpt_type, field_group, field_value,
};
use crate::error::EngineError;
use crate::location::RuleContext;
use crate::models::shared::validate_title;
use crate::post_status::PostStatus;
use crate::repository::groups::FieldGroupRepository;
use crate::repository::values::ENTITY_CPT_POST;
use crate::slug::resolve_slug;

/// Caller-supplied post payload for `save`.
#[derive(Debug, Clone)]
pub struct CptPostInput {
    pub type_id: i32,
    pub slug: Option<String>,
    pub title: String,
    pub status: PostStatus,
    pub employee_id: Option<i32>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_meta: Json,
}

/// CRUD and the publish state machine for CPT posts. Field values for posts
/// go through the shared [`ValueStore`] under the "cpt_post" entity type.
pub struct CptPostRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> CptPostRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find(&self, id: i32) -> Result<Option<cpt_post::Model>, EngineError> {
        Ok(cpt_post::Entity::find_by_id(id).one(self.conn).await?)
    }

    pub async fn get(&self, id: i32) -> Result<cpt_post::Model, EngineError> {
        self.find(id)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT post", id))
    }

    /// Post slugs are scoped to their type: two types may reuse a slug.
    pub async fn find_by_slug(
        &self,
        type_id: i32,
        slug: &str,
    ) -> Result<Option<cpt_post::Model>, EngineError> {
        Ok(cpt_post::Entity::find()
            .filter(cpt_post::Column::TypeId.eq(type_id))
            .filter(cpt_post::Column::Slug.eq(slug))
            .one(self.conn)
            .await?)
    }

    pub async fn list_by_type(
        &self,
        type_id: i32,
        include_drafts: bool,
    ) -> Result<Vec<cpt_post::Model>, EngineError> {
        let mut select = cpt_post::Entity::find().filter(cpt_post::Column::TypeId.eq(type_id));
        if !include_drafts {
            select = select.filter(cpt_post::Column::Status.eq(PostStatus::Published));
        }
        Ok(select
            .order_by_desc(cpt_post::Column::CreatedAt)
            .all(self.conn)
            .await?)
    }

    pub async fn is_slug_taken(
        &self,
        type_id: i32,
        slug: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, EngineError> {
        let mut select = cpt_post::Entity::find()
            .filter(cpt_post::Column::TypeId.eq(type_id))
            .filter(cpt_post::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            select = select.filter(cpt_post::Column::Id.ne(id));
        }
        Ok(select.count(self.conn).await? > 0)
    }

    #[instrument(skip(self, input), fields(title = %input.title, type_id = input.type_id))]
    pub async fn save(
        &self,
        input: CptPostInput,
        id: Option<i32>,
    ) -> Result<cpt_post::Model, EngineError> {
        validate_title(&input.title)?;
        cpt_type::Entity::find_by_id(input.type_id)
            .one(self.conn)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT type", input.type_id))?;

        let slug = resolve_slug(input.slug.as_deref(), &input.title, "post");
        if self.is_slug_taken(input.type_id, &slug, id).await? {
            return Err(EngineError::Conflict(format!(
                "Post slug '{slug}' already exists in this type"
            )));
        }

        let now = chrono::Utc::now();
        match id {
            None => {
                let model = cpt_post::ActiveModel {
                    uuid: Set(Uuid::new_v4()),
                    type_id: Set(input.type_id),
                    slug: Set(slug),
                    title: Set(input.title.trim().to_string()),
                    status: Set(input.status),
                    employee_id: Set(input.employee_id),
                    seo_title: Set(input.seo_title),
                    seo_description: Set(input.seo_description),
                    seo_meta: Set(input.seo_meta),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                Ok(model.insert(self.conn).await?)
            }
            Some(id) => {
                let existing = self.get(id).await?;
                let mut active: cpt_post::ActiveModel = existing.into();
                active.type_id = Set(input.type_id);
                active.slug = Set(slug);
                active.title = Set(input.title.trim().to_string());
                active.status = Set(input.status);
                active.employee_id = Set(input.employee_id);
                active.seo_title = Set(input.seo_title);
                active.seo_description = Set(input.seo_description);
                active.seo_meta = Set(input.seo_meta);
                active.updated_at = Set(now);
                Ok(active.update(self.conn).await?)
            }
        }
    }

    pub async fn publish(&self, id: i32) -> Result<cpt_post::Model, EngineError> {
        self.transition(id, PostStatus::Published).await
    }

    pub async fn unpublish(&self, id: i32) -> Result<cpt_post::Model, EngineError> {
        self.transition(id, PostStatus::Draft).await
    }

    /// Set a status from caller input. Anything outside the enum fails
    /// loudly, never silently coerced.
    pub async fn set_status(&self, id: i32, status: &str) -> Result<cpt_post::Model, EngineError> {
        let status =
            PostStatus::from_str(status).map_err(|e| EngineError::Validation(e.to_string()))?;
        self.transition(id, status).await
    }

    async fn transition(
        &self,
        id: i32,
        status: PostStatus,
    ) -> Result<cpt_post::Model, EngineError> {
        let existing = self.get(id).await?;
        let mut active: cpt_post::ActiveModel = existing.into();
        active.status = Set(status);
        active.updated_at = Set(chrono::Utc::now());
        Ok(active.update(self.conn).await?)
    }

    /// Hard delete with cascading cleanup: translations, shop links, term
    /// links, relation edges on either side, and the post's field values.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), EngineError> {
        let txn = self.conn.begin().await?;

        cpt_post::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT post", id))?;

        cpt_post_translation::Entity::delete_many()
            .filter(cpt_post_translation::Column::PostId.eq(id))
            .exec(&txn)
            .await?;
        cpt_post_shop::Entity::delete_many()
            .filter(cpt_post_shop::Column::PostId.eq(id))
            .exec(&txn)
            .await?;
        cpt_post_term::Entity::delete_many()
            .filter(cpt_post_term::Column::PostId.eq(id))
            .exec(&txn)
            .await?;
        cpt_relation_link::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(cpt_relation_link::Column::SourcePostId.eq(id))
                    .add(cpt_relation_link::Column::TargetPostId.eq(id)),
            )
            .exec(&txn)
            .await?;
        field_value::Entity::delete_many()
            .filter(field_value::Column::EntityType.eq(ENTITY_CPT_POST))
            .filter(field_value::Column::EntityId.eq(id))
            .exec(&txn)
            .await?;
        cpt_post::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Replace the terms attached to a post.
    #[instrument(skip(self, term_ids))]
    pub async fn sync_terms(&self, post_id: i32, term_ids: &[i32]) -> Result<(), EngineError> {
        let txn = self.conn.begin().await?;
        cpt_post::Entity::find_by_id(post_id)
            .one(&txn)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT post", post_id))?;

        for &term_id in term_ids {
            cpt_term::Entity::find_by_id(term_id)
                .one(&txn)
                .await?
                .ok_or_else(|| EngineError::not_found("CPT term", term_id))?;
        }

        cpt_post_term::Entity::delete_many()
            .filter(cpt_post_term::Column::PostId.eq(post_id))
            .exec(&txn)
            .await?;
        for &term_id in term_ids {
            let link = cpt_post_term::ActiveModel {
                post_id: Set(post_id),
                term_id: Set(term_id),
            };
            link.insert(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    pub async fn terms(&self, post_id: i32) -> Result<Vec<cpt_term::Model>, EngineError> {
        let term_ids: Vec<i32> = cpt_post_term::Entity::find()
            .filter(cpt_post_term::Column::PostId.eq(post_id))
            .select_only()
            .column(cpt_post_term::Column::TermId)
            .into_tuple()
            .all(self.conn)
            .await?;
        if term_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(cpt_term::Entity::find()
            .filter(cpt_term::Column::Id.is_in(term_ids))
            .order_by_asc(cpt_term::Column::Position)
            .all(self.conn)
            .await?)
    }

    pub async fn upsert_translation(
        &self,
        post_id: i32,
        lang_id: i32,
        title: &str,
        seo_title: Option<&str>,
        seo_description: Option<&str>,
    ) -> Result<(), EngineError> {
        validate_title(title)?;
        self.get(post_id).await?;

        let model = cpt_post_translation::ActiveModel {
            post_id: Set(post_id),
            lang_id: Set(lang_id),
            title: Set(title.trim().to_string()),
            seo_title: Set(seo_title.map(str::to_string)),
            seo_description: Set(seo_description.map(str::to_string)),
        };
        cpt_post_translation::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    cpt_post_translation::Column::PostId,
                    cpt_post_translation::Column::LangId,
                ])
                .update_columns([
                    cpt_post_translation::Column::Title,
                    cpt_post_translation::Column::SeoTitle,
                    cpt_post_translation::Column::SeoDescription,
                ])
                .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;
        Ok(())
    }

    /// Replace the shops a post is visible in.
    #[instrument(skip(self, shop_ids))]
    pub async fn sync_shops(&self, post_id: i32, shop_ids: &[i32]) -> Result<(), EngineError> {
        let txn = self.conn.begin().await?;
        cpt_post::Entity::find_by_id(post_id)
            .one(&txn)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT post", post_id))?;

        cpt_post_shop::Entity::delete_many()
            .filter(cpt_post_shop::Column::PostId.eq(post_id))
            .exec(&txn)
            .await?;
        for &shop_id in shop_ids {
            let link = cpt_post_shop::ActiveModel {
                post_id: Set(post_id),
                shop_id: Set(shop_id),
            };
            link.insert(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Rule context for a post: the entity type plus its CPT type slug.
    pub async fn build_context(&self, post_id: i32) -> Result<RuleContext, EngineError> {
        let post = self.get(post_id).await?;
        let cpt_type = cpt_type::Entity::find_by_id(post.type_id)
            .one(self.conn)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT type", post.type_id))?;

        let mut ctx = RuleContext::new();
        ctx.insert("entity_type".into(), serde_json::json!(ENTITY_CPT_POST));
        ctx.insert("cpt_type_slug".into(), serde_json::json!(cpt_type.slug));
        ctx.insert("cpt_type_id".into(), serde_json::json!(cpt_type.id));
        Ok(ctx)
    }

    /// ACF groups applicable to this post: location rules evaluated against
    /// the post context, with global-scope groups excluded; those are
    /// edited elsewhere, never per-post.
    pub async fn matching_groups(
        &self,
        post_id: i32,
    ) -> Result<Vec<field_group::Model>, EngineError> {
        let ctx = self.build_context(post_id).await?;
        FieldGroupRepository::new(self.conn)
            .matching(&ctx, true)
            .await
    }
}
