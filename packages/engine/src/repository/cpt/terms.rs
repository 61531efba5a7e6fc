use std::collections::HashMap;

use sea_orm::*;
use tracing::instrument;

use crate::entity::{cpt_post_term, cpt_taxonomy, cpt_term};
use crate::error::EngineError;
use crate::models::shared::{validate_optional_position, validate_title};
use crate::slug::resolve_slug;

/// Caller-supplied term payload for `save`.
#[derive(Debug, Clone, Default)]
pub struct CptTermInput {
    pub taxonomy_id: i32,
    pub parent_id: Option<i32>,
    pub slug: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub position: Option<i32>,
    pub active: bool,
}

/// A term with its children, assembled from one flat query.
#[derive(Debug, Clone)]
pub struct TermNode {
    pub term: cpt_term::Model,
    pub children: Vec<TermNode>,
}

pub struct CptTermRepository<'a, C> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> CptTermRepository<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find(&self, id: i32) -> Result<Option<cpt_term::Model>, EngineError> {
        Ok(cpt_term::Entity::find_by_id(id).one(self.conn).await?)
    }

    pub async fn get(&self, id: i32) -> Result<cpt_term::Model, EngineError> {
        self.find(id)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT term", id))
    }

    pub async fn find_by_taxonomy(
        &self,
        taxonomy_id: i32,
    ) -> Result<Vec<cpt_term::Model>, EngineError> {
        Ok(cpt_term::Entity::find()
            .filter(cpt_term::Column::TaxonomyId.eq(taxonomy_id))
            .filter(cpt_term::Column::Active.eq(true))
            .order_by_asc(cpt_term::Column::Position)
            .order_by_asc(cpt_term::Column::Id)
            .all(self.conn)
            .await?)
    }

    pub async fn is_slug_taken(
        &self,
        taxonomy_id: i32,
        slug: &str,
        exclude_id: Option<i32>,
    ) -> Result<bool, EngineError> {
        let mut select = cpt_term::Entity::find()
            .filter(cpt_term::Column::TaxonomyId.eq(taxonomy_id))
            .filter(cpt_term::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            select = select.filter(cpt_term::Column::Id.ne(id));
        }
        Ok(select.count(self.conn).await? > 0)
    }

    #[instrument(skip(self, input), fields(name = %input.name, taxonomy_id = input.taxonomy_id))]
    pub async fn save(
        &self,
        input: CptTermInput,
        id: Option<i32>,
    ) -> Result<cpt_term::Model, EngineError> {
        validate_title(&input.name)?;
        validate_optional_position(input.position)?;
        cpt_taxonomy::Entity::find_by_id(input.taxonomy_id)
            .one(self.conn)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT taxonomy", input.taxonomy_id))?;

        if let Some(parent_id) = input.parent_id {
            let parent = self
                .find(parent_id)
                .await?
                .ok_or_else(|| EngineError::not_found("Parent term", parent_id))?;
            if parent.taxonomy_id != input.taxonomy_id {
                return Err(EngineError::Validation(
                    "Parent term belongs to a different taxonomy".into(),
                ));
            }
            // The data model does not forbid cycles; reject them at write
            // time so admin input cannot create one.
            if let Some(id) = id {
                self.ensure_not_ancestor(id, parent_id).await?;
            }
        }

        let slug = resolve_slug(input.slug.as_deref(), &input.name, "term");
        if self.is_slug_taken(input.taxonomy_id, &slug, id).await? {
            return Err(EngineError::Conflict(format!(
                "Term slug '{slug}' already exists in this taxonomy"
            )));
        }

        let position = match input.position {
            Some(p) => p,
            None => self
                .next_position(input.taxonomy_id, input.parent_id)
                .await?,
        };

        let now = chrono::Utc::now();
        match id {
            None => {
                let model = cpt_term::ActiveModel {
                    taxonomy_id: Set(input.taxonomy_id),
                    parent_id: Set(input.parent_id),
                    slug: Set(slug),
                    name: Set(input.name.trim().to_string()),
                    description: Set(input.description),
                    position: Set(position),
                    active: Set(input.active),
                    created_at: Set(now),
                    ..Default::default()
                };
                Ok(model.insert(self.conn).await?)
            }
            Some(id) => {
                let existing = self.get(id).await?;
                let mut active: cpt_term::ActiveModel = existing.into();
                active.taxonomy_id = Set(input.taxonomy_id);
                active.parent_id = Set(input.parent_id);
                active.slug = Set(slug);
                active.name = Set(input.name.trim().to_string());
                active.description = Set(input.description);
                active.position = Set(position);
                active.active = Set(input.active);
                Ok(active.update(self.conn).await?)
            }
        }
    }

    /// In-memory tree of a taxonomy's active terms. One flat query keyed by
    /// parent_id; depth is unbounded. Rows whose parent chain never reaches
    /// a root (including any cycle that predates the write-time guard) do
    /// not appear.
    pub async fn get_tree(&self, taxonomy_id: i32) -> Result<Vec<TermNode>, EngineError> {
        let terms = self.find_by_taxonomy(taxonomy_id).await?;

        let mut children_of: HashMap<Option<i32>, Vec<cpt_term::Model>> = HashMap::new();
        for term in terms {
            children_of.entry(term.parent_id).or_default().push(term);
        }

        fn attach(
            parent: Option<i32>,
            children_of: &mut HashMap<Option<i32>, Vec<cpt_term::Model>>,
        ) -> Vec<TermNode> {
            children_of
                .remove(&parent)
                .unwrap_or_default()
                .into_iter()
                .map(|term| {
                    let id = term.id;
                    TermNode {
                        term,
                        children: attach(Some(id), children_of),
                    }
                })
                .collect()
        }

        Ok(attach(None, &mut children_of))
    }

    /// Hard delete of a term and its whole subtree, post links included.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), EngineError> {
        let txn = self.conn.begin().await?;

        let term = cpt_term::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| EngineError::not_found("CPT term", id))?;

        // Walk the subtree from the flat sibling table.
        let all: Vec<cpt_term::Model> = cpt_term::Entity::find()
            .filter(cpt_term::Column::TaxonomyId.eq(term.taxonomy_id))
            .all(&txn)
            .await?;
        let mut children_of: HashMap<i32, Vec<i32>> = HashMap::new();
        for t in &all {
            if let Some(parent_id) = t.parent_id {
                children_of.entry(parent_id).or_default().push(t.id);
            }
        }
        let mut subtree = vec![id];
        let mut queue = vec![id];
        while let Some(current) = queue.pop() {
            if let Some(kids) = children_of.remove(&current) {
                subtree.extend(&kids);
                queue.extend(kids);
            }
        }

        cpt_post_term::Entity::delete_many()
            .filter(cpt_post_term::Column::TermId.is_in(subtree.clone()))
            .exec(&txn)
            .await?;
        cpt_term::Entity::delete_many()
            .filter(cpt_term::Column::Id.is_in(subtree))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(())
    }

    /// Reject a parent assignment that would make `id` its own ancestor.
    async fn ensure_not_ancestor(&self, id: i32, new_parent: i32) -> Result<(), EngineError> {
        if id == new_parent {
            return Err(EngineError::Validation(
                "Term cannot be its own parent".into(),
            ));
        }
        let mut cursor = Some(new_parent);
        let mut hops = 0;
        while let Some(current) = cursor {
            if current == id {
                return Err(EngineError::Validation(
                    "Term cannot be moved under its own descendant".into(),
                ));
            }
            hops += 1;
            if hops > 1000 {
                return Err(EngineError::Validation(
                    "Term hierarchy is too deep or cyclic".into(),
                ));
            }
            cursor = cpt_term::Entity::find_by_id(current)
                .one(self.conn)
                .await?
                .and_then(|t| t.parent_id);
        }
        Ok(())
    }

    async fn next_position(
        &self,
        taxonomy_id: i32,
        parent_id: Option<i32>,
    ) -> Result<i32, EngineError> {
        let mut select = cpt_term::Entity::find()
            .filter(cpt_term::Column::TaxonomyId.eq(taxonomy_id));
        select = match parent_id {
            Some(parent_id) => select.filter(cpt_term::Column::ParentId.eq(parent_id)),
            None => select.filter(cpt_term::Column::ParentId.is_null()),
        };
        let max_pos: Option<i32> = select
            .select_only()
            .column_as(cpt_term::Column::Position.max(), "max_pos")
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
