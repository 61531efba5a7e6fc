use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use sea_orm::entity::prelude::Json;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{cpt_type_group, field, field_group, field_translation, field_value};
use crate::error::EngineError;
use crate::location::{RuleContext, match_location};
use crate::models::group::GroupDto;
use crate::models::shared::{Pagination, escape_like, validate_title};
use crate::slug::{resolve_slug, synthesized_slug};

/// Caller-supplied group payload for `save`.
#[derive(Debug, Clone, Default)]
pub struct GroupInput {
    pub title: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub location_rules: Json,
    pub placement: Json,
    pub bo_options: Json,
    pub fo_options: Json,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GroupListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub search: Option<String>,
    pub active_only: bool,
}

pub struct GroupPage {
    pub data: Vec<field_group::Model>,
    pub pagination: Pagination,
}

/// CRUD for field groups: slug-checked saves, paginated listing, cascade
/// delete, deep-copy duplication, and location-rule matching.
pub struct FieldGroupRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> FieldGroupRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find(&self, id: i32) -> Result<Option<field_group::Model>, EngineError> {
        Ok(field_group::Entity::find_by_id(id).one(self.conn).await?)
    }

    pub async fn get(&self, id: i32) -> Result<field_group::Model, EngineError> {
        self.find(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Field group", id))
    }

    pub async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<field_group::Model>, EngineError> {
        Ok(field_group::Entity::find()
            .filter(field_group::Column::Slug.eq(slug))
            .one(self.conn)
            .await?)
    }

    pub async fn is_slug_taken(
        &self,
        slug: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, EngineError> {
        group_slug_taken(self.conn, slug, exclude_id).await
    }

    #[instrument(skip(self, query))]
    pub async fn list(&self, query: &GroupListQuery) -> Result<GroupPage, EngineError> {
        let page = Ord::max(query.page.unwrap_or(1), 1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

        let mut select = field_group::Entity::find();
        if query.active_only {
            select = select.filter(field_group::Column::Active.eq(true));
        }
        if let Some(ref search) = query.search {
            let term = escape_like(search.trim());
            if !term.is_empty() {
                select = select.filter(
                    Expr::expr(Func::lower(Expr::col(field_group::Column::Title)))
                        .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
                );
            }
        }

        let total = select
            .clone()
            .paginate(self.conn, per_page)
            .num_items()
            .await?;
        let total_pages = total.div_ceil(per_page);

        let data = select
            .order_by_desc(field_group::Column::CreatedAt)
            .offset(Some((page - 1) * per_page))
            .limit(Some(per_page))
            .all(self.conn)
            .await?;

        Ok(GroupPage {
            data,
            pagination: Pagination {
                page,
                per_page,
                total,
                total_pages,
            },
        })
    }

    /// Insert (no id) or full-row update. Slug conflicts are checked here,
    /// before the statement; the database unique constraint is only a safety
    /// net.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn save(
        &self,
        input: GroupInput,
        id: Option<i32>,
    ) -> Result<field_group::Model, EngineError> {
        validate_title(&input.title)?;
        let slug = resolve_slug(input.slug.as_deref(), &input.title, "group");
        if self.is_slug_taken(&slug, id).await? {
            return Err(EngineError::Conflict(format!(
                "Group slug '{slug}' already exists"
            )));
        }

        let now = chrono::Utc::now();
        match id {
            None => {
                let model = field_group::ActiveModel {
                    uuid: Set(Uuid::new_v4()),
                    title: Set(input.title.trim().to_string()),
                    slug: Set(slug),
                    description: Set(input.description),
                    location_rules: Set(input.location_rules),
                    placement: Set(input.placement),
                    bo_options: Set(input.bo_options),
                    fo_options: Set(input.fo_options),
                    active: Set(input.active),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                Ok(model.insert(self.conn).await?)
            }
            Some(id) => {
                let existing = self.get(id).await?;
                let mut active: field_group::ActiveModel = existing.into();
                active.title = Set(input.title.trim().to_string());
                active.slug = Set(slug);
                active.description = Set(input.description);
                active.location_rules = Set(input.location_rules);
                active.placement = Set(input.placement);
                active.bo_options = Set(input.bo_options);
                active.fo_options = Set(input.fo_options);
                active.active = Set(input.active);
                active.updated_at = Set(now);
                Ok(active.update(self.conn).await?)
            }
        }
    }

    /// Hard delete with cascading cleanup: values, translations and fields
    /// (repeater children included), plus CPT attachments, in one
    /// transaction.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), EngineError> {
        let txn = self.conn.begin().await?;

        field_group::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| EngineError::not_found("Field group", id))?;

        let top_ids: Vec<i32> = field::Entity::find()
            .filter(field::Column::GroupId.eq(id))
            .select_only()
            .column(field::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;

        let child_ids: Vec<i32> = if top_ids.is_empty() {
            Vec::new()
        } else {
            field::Entity::find()
                .filter(field::Column::ParentId.is_in(top_ids.clone()))
                .select_only()
                .column(field::Column::Id)
                .into_tuple()
                .all(&txn)
                .await?
        };

        let mut all_ids = top_ids.clone();
        all_ids.extend(&child_ids);
        if !all_ids.is_empty() {
            field_value::Entity::delete_many()
                .filter(field_value::Column::FieldId.is_in(all_ids.clone()))
                .exec(&txn)
                .await?;
            field_translation::Entity::delete_many()
                .filter(field_translation::Column::FieldId.is_in(all_ids))
                .exec(&txn)
                .await?;
        }
        if !child_ids.is_empty() {
            field::Entity::delete_many()
                .filter(field::Column::Id.is_in(child_ids))
                .exec(&txn)
                .await?;
        }
        if !top_ids.is_empty() {
            field::Entity::delete_many()
                .filter(field::Column::Id.is_in(top_ids))
                .exec(&txn)
                .await?;
        }
        cpt_type_group::Entity::delete_many()
            .filter(cpt_type_group::Column::GroupId.eq(id))
            .exec(&txn)
            .await?;
        field_group::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Deep-copy a group: new uuid, suffixed re-uniquified slug, all fields
    /// (and repeater children) copied with regenerated slugs. The copy is
    /// created inactive so it cannot silently go live before review.
    #[instrument(skip(self))]
    pub async fn duplicate(&self, id: i32) -> Result<field_group::Model, EngineError> {
        let source = self.get(id).await?;
        let txn = self.conn.begin().await?;
        let now = chrono::Utc::now();

        let slug = unique_group_slug(&txn, &format!("{}_copy", source.slug)).await?;
        let copy = field_group::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            title: Set(source.title.clone()),
            slug: Set(slug),
            description: Set(source.description.clone()),
            location_rules: Set(source.location_rules.clone()),
            placement: Set(source.placement.clone()),
            bo_options: Set(source.bo_options.clone()),
            fo_options: Set(source.fo_options.clone()),
            active: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let copy = copy.insert(&txn).await?;

        let top_fields = field::Entity::find()
            .filter(field::Column::GroupId.eq(source.id))
            .order_by_asc(field::Column::Position)
            .all(&txn)
            .await?;

        for f in top_fields {
            let field_slug =
                unique_field_slug(&txn, Some(copy.id), None, &format!("{}_copy", f.slug)).await?;
            let new_field = copy_field(&f, Some(copy.id), None, field_slug, now)
                .insert(&txn)
                .await?;

            let children = field::Entity::find()
                .filter(field::Column::ParentId.eq(f.id))
                .order_by_asc(field::Column::Position)
                .all(&txn)
                .await?;
            for child in children {
                let child_slug = unique_field_slug(
                    &txn,
                    None,
                    Some(new_field.id),
                    &format!("{}_copy", child.slug),
                )
                .await?;
                copy_field(&child, None, Some(new_field.id), child_slug, now)
                    .insert(&txn)
                    .await?;
            }
        }

        txn.commit().await?;
        Ok(copy)
    }

    /// Wire DTO of a group with its fields attached (children nested under
    /// repeaters, translations included).
    pub async fn dto(&self, id: i32) -> Result<GroupDto, EngineError> {
        let group = self.get(id).await?;
        let fields = crate::repository::fields::FieldRepository::new(self.conn)
            .dtos_for_group(group.id)
            .await?;
        Ok(GroupDto::from_model(group, fields))
    }

    /// Active groups whose location rules match the context. `exclude_global`
    /// drops groups whose bo_options mark them global-scope; those are
    /// rendered and edited elsewhere, never per-entity.
    pub async fn matching(
        &self,
        ctx: &RuleContext,
        exclude_global: bool,
    ) -> Result<Vec<field_group::Model>, EngineError> {
        let groups = field_group::Entity::find()
            .filter(field_group::Column::Active.eq(true))
            .order_by_asc(field_group::Column::Id)
            .all(self.conn)
            .await?;

        Ok(groups
            .into_iter()
            .filter(|g| {
                if exclude_global
                    && g.bo_options.get("scope").and_then(|v| v.as_str()) == Some("global")
                {
                    return false;
                }
                match_location(&g.location_rules, ctx)
            })
            .collect())
    }
}

fn copy_field(
    source: &field::Model,
    group_id: Option<i32>,
    parent_id: Option<i32>,
    slug: String,
    now: chrono::DateTime<chrono::Utc>,
) -> field::ActiveModel {
    field::ActiveModel {
        uuid: Set(Uuid::new_v4()),
        group_id: Set(group_id),
        parent_id: Set(parent_id),
        field_type: Set(source.field_type.clone()),
        title: Set(source.title.clone()),
        slug: Set(slug),
        instructions: Set(source.instructions.clone()),
        config: Set(source.config.clone()),
        validation: Set(source.validation.clone()),
        conditions: Set(source.conditions.clone()),
        wrapper: Set(source.wrapper.clone()),
        fo_options: Set(source.fo_options.clone()),
        position: Set(source.position),
        translatable: Set(source.translatable),
        active: Set(source.active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}

pub(crate) async fn group_slug_taken<C: ConnectionTrait>(
    conn: &C,
    slug: &str,
    exclude_id: Option<i32>,
) -> Result<bool, EngineError> {
    let mut select = field_group::Entity::find().filter(field_group::Column::Slug.eq(slug));
    if let Some(id) = exclude_id {
        select = select.filter(field_group::Column::Id.ne(id));
    }
    Ok(select.count(conn).await? > 0)
}

/// First free variant of `base`: base, base_2, base_3, ... with a
/// synthesized slug as the terminal fallback.
pub(crate) async fn unique_group_slug<C: ConnectionTrait>(
    conn: &C,
    base: &str,
) -> Result<String, EngineError> {
    if !group_slug_taken(conn, base, None).await? {
        return Ok(base.to_string());
    }
    for n in 2..=50 {
        let candidate = format!("{base}_{n}");
        if !group_slug_taken(conn, &candidate, None).await? {
            return Ok(candidate);
        }
    }
    Ok(synthesized_slug(base))
}

/// Field-slug uniqueness is scoped: top-level fields check their siblings in
/// the group, repeater children check their siblings under the parent.
pub(crate) async fn field_slug_taken<C: ConnectionTrait>(
    conn: &C,
    group_id: Option<i32>,
    parent_id: Option<i32>,
    slug: &str,
    exclude_id: Option<i32>,
) -> Result<bool, EngineError> {
    let mut select = field::Entity::find().filter(field::Column::Slug.eq(slug));
    select = match (group_id, parent_id) {
        (_, Some(parent_id)) => select.filter(field::Column::ParentId.eq(parent_id)),
        (Some(group_id), None) => select.filter(field::Column::GroupId.eq(group_id)),
        (None, None) => select.filter(field::Column::GroupId.is_null()),
    };
    if let Some(id) = exclude_id {
        select = select.filter(field::Column::Id.ne(id));
    }
    Ok(select.count(conn).await? > 0)
}

pub(crate) async fn unique_field_slug<C: ConnectionTrait>(
    conn: &C,
    group_id: Option<i32>,
    parent_id: Option<i32>,
    base: &str,
) -> Result<String, EngineError> {
    if !field_slug_taken(conn, group_id, parent_id, base, None).await? {
        return Ok(base.to_string());
    }
    for n in 2..=50 {
        let candidate = format!("{base}_{n}");
        if !field_slug_taken(conn, group_id, parent_id, &candidate, None).await? {
            return Ok(candidate);
        }
    }
    Ok(synthesized_slug(base))
}
