use engine::EngineError;
use engine::post_status::PostStatus;
use engine::provider::EntityFieldProvider;
use engine::repository::cpt::{
    CptPostInput, CptPostProvider, CptPostRepository, CptRelationInput, CptRelationRepository,
    CptTaxonomyInput, CptTaxonomyRepository, CptTermInput, CptTermRepository, CptTypeInput,
    CptTypeRepository,
};
use engine::repository::groups::{FieldGroupRepository, GroupInput};
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::common::setup;

async fn create_type(db: &DatabaseConnection, name: &str, slug: &str) -> engine::entity::cpt_type::Model {
    CptTypeRepository::new(db)
        .save(
            CptTypeInput {
                slug: Some(slug.into()),
                name: name.into(),
                url_prefix: slug.into(),
                active: true,
                ..Default::default()
            },
            None,
        )
        .await
        .expect("create type")
}

async fn create_post(
    db: &DatabaseConnection,
    type_id: i32,
    title: &str,
    slug: &str,
) -> engine::entity::cpt_post::Model {
    CptPostRepository::new(db)
        .save(
            CptPostInput {
                type_id,
                slug: Some(slug.into()),
                title: title.into(),
                status: PostStatus::Draft,
                employee_id: None,
                seo_title: None,
                seo_description: None,
                seo_meta: json!({}),
            },
            None,
        )
        .await
        .expect("create post")
}

#[tokio::test]
async fn post_status_machine_publishes_and_unpublishes() {
    let (db, _) = setup().await;
    let blog = create_type(&db, "Blog", "blog").await;
    let post = create_post(&db, blog.id, "Hello World", "hello-world").await;

    assert!(!post.status.is_published());
    assert!(post.status.is_draft());

    let repo = CptPostRepository::new(&db);
    let published = repo.publish(post.id).await.expect("publish");
    assert!(published.status.is_published());
    assert!(!published.status.is_draft());

    let drafted = repo.unpublish(post.id).await.expect("unpublish");
    assert!(drafted.status.is_draft());
}

#[tokio::test]
async fn set_status_fails_loudly_on_invalid_input() {
    let (db, _) = setup().await;
    let blog = create_type(&db, "Blog", "blog").await;
    let post = create_post(&db, blog.id, "Hello", "hello").await;

    let repo = CptPostRepository::new(&db);
    let err = repo.set_status(post.id, "pending").await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let ok = repo.set_status(post.id, "published").await.expect("set status");
    assert_eq!(ok.status, PostStatus::Published);
}

#[tokio::test]
async fn post_slugs_are_scoped_per_type() {
    let (db, _) = setup().await;
    let blog = create_type(&db, "Blog", "blog").await;
    let faq = create_type(&db, "FAQ", "faq").await;

    create_post(&db, blog.id, "Hello", "hello").await;
    // Same slug under another type is fine.
    create_post(&db, faq.id, "Hello", "hello").await;

    let err = CptPostRepository::new(&db)
        .save(
            CptPostInput {
                type_id: blog.id,
                slug: Some("hello".into()),
                title: "Hello again".into(),
                status: PostStatus::Draft,
                employee_id: None,
                seo_title: None,
                seo_description: None,
                seo_meta: json!({}),
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn term_tree_assembles_from_flat_rows() {
    let (db, _) = setup().await;
    let taxonomy = CptTaxonomyRepository::new(&db)
        .save(
            CptTaxonomyInput {
                name: "Topics".into(),
                slug: Some("topics".into()),
                hierarchical: true,
                active: true,
                ..Default::default()
            },
            None,
        )
        .await
        .expect("create taxonomy");

    let terms = CptTermRepository::new(&db);
    let rust = terms
        .save(
            CptTermInput {
                taxonomy_id: taxonomy.id,
                name: "Rust".into(),
                active: true,
                ..Default::default()
            },
            None,
        )
        .await
        .expect("create root term");
    let async_term = terms
        .save(
            CptTermInput {
                taxonomy_id: taxonomy.id,
                parent_id: Some(rust.id),
                name: "Async".into(),
                active: true,
                ..Default::default()
            },
            None,
        )
        .await
        .expect("create child term");
    terms
        .save(
            CptTermInput {
                taxonomy_id: taxonomy.id,
                parent_id: Some(async_term.id),
                name: "Runtimes".into(),
                active: true,
                ..Default::default()
            },
            None,
        )
        .await
        .expect("create grandchild term");

    let tree = terms.get_tree(taxonomy.id).await.expect("tree");
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].term.name, "Rust");
    assert_eq!(tree[0].children.len(), 1);
    assert_eq!(tree[0].children[0].term.name, "Async");
    assert_eq!(tree[0].children[0].children[0].term.name, "Runtimes");
}

#[tokio::test]
async fn term_cycles_are_rejected_at_write_time() {
    let (db, _) = setup().await;
    let taxonomy = CptTaxonomyRepository::new(&db)
        .save(
            CptTaxonomyInput {
                name: "Topics".into(),
                slug: Some("topics".into()),
                hierarchical: true,
                active: true,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    let terms = CptTermRepository::new(&db);
    let parent = terms
        .save(
            CptTermInput {
                taxonomy_id: taxonomy.id,
                name: "Parent".into(),
                active: true,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    let child = terms
        .save(
            CptTermInput {
                taxonomy_id: taxonomy.id,
                parent_id: Some(parent.id),
                name: "Child".into(),
                active: true,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    // Moving the parent under its own descendant would close a cycle.
    let err = terms
        .save(
            CptTermInput {
                taxonomy_id: taxonomy.id,
                parent_id: Some(child.id),
                name: "Parent".into(),
                slug: Some(parent.slug.clone()),
                active: true,
                ..Default::default()
            },
            Some(parent.id),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn relations_sync_ordered_edges_atomically() {
    let (db, _) = setup().await;
    let author_type = create_type(&db, "Author", "author").await;
    let book_type = create_type(&db, "Book", "book").await;

    let relation = CptRelationRepository::new(&db)
        .save(
            CptRelationInput {
                name: "Author Books".into(),
                slug: Some("author_books".into()),
                source_type_id: author_type.id,
                target_type_id: book_type.id,
                active: true,
                ..Default::default()
            },
            None,
        )
        .await
        .expect("create relation");

    let author = create_post(&db, author_type.id, "Ursula", "ursula").await;
    let book_a = create_post(&db, book_type.id, "Book A", "book-a").await;
    let book_b = create_post(&db, book_type.id, "Book B", "book-b").await;
    let book_c = create_post(&db, book_type.id, "Book C", "book-c").await;

    let relations = CptRelationRepository::new(&db);
    relations
        .sync_related(relation.id, author.id, &[book_b.id, book_a.id])
        .await
        .expect("sync");

    let related = relations.related(relation.id, author.id).await.unwrap();
    let ids: Vec<i32> = related.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![book_b.id, book_a.id]);

    // Replacing the edge set drops what is no longer listed.
    relations
        .sync_related(relation.id, author.id, &[book_c.id])
        .await
        .expect("re-sync");
    let related = relations.related(relation.id, author.id).await.unwrap();
    let ids: Vec<i32> = related.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![book_c.id]);

    // An author is not a valid target for this relation.
    let err = relations
        .sync_related(relation.id, author.id, &[author.id])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // Nor is a book a valid source.
    let err = relations
        .sync_related(relation.id, book_a.id, &[book_b.id])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn post_matching_uses_type_slug_and_skips_global_groups() {
    let (db, _) = setup().await;
    let blog = create_type(&db, "Blog", "blog").await;
    let faq = create_type(&db, "FAQ", "faq").await;
    let blog_post = create_post(&db, blog.id, "Hello", "hello").await;
    let faq_post = create_post(&db, faq.id, "What is this", "what-is-this").await;

    let groups = FieldGroupRepository::new(&db);
    groups
        .save(
            GroupInput {
                title: "Blog extras".into(),
                slug: Some("blog_extras".into()),
                location_rules: json!({
                    "and": [
                        { "==": [{ "var": "entity_type" }, "cpt_post"] },
                        { "==": [{ "var": "cpt_type_slug" }, "blog"] },
                    ]
                }),
                active: true,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    groups
        .save(
            GroupInput {
                title: "Site settings".into(),
                slug: Some("site_settings".into()),
                bo_options: json!({ "scope": "global" }),
                active: true,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    let posts = CptPostRepository::new(&db);
    let matched = posts.matching_groups(blog_post.id).await.expect("matching");
    let slugs: Vec<&str> = matched.iter().map(|g| g.slug.as_str()).collect();
    assert_eq!(slugs, vec!["blog_extras"]);

    let matched = posts.matching_groups(faq_post.id).await.expect("matching");
    assert!(matched.is_empty());
}

#[tokio::test]
async fn provider_context_degrades_instead_of_failing() {
    let (db, _) = setup().await;
    let blog = create_type(&db, "Blog", "blog").await;
    let post = create_post(&db, blog.id, "Hello", "hello").await;

    let provider = CptPostProvider;
    let ctx = provider.build_context(&db, post.id).await;
    assert_eq!(ctx.get("entity_type"), Some(&json!("cpt_post")));
    assert_eq!(ctx.get("cpt_type_slug"), Some(&json!("blog")));

    // Unknown ids fall back to the minimal context rather than erroring.
    let ctx = provider.build_context(&db, 9999).await;
    assert_eq!(ctx.get("entity_type"), Some(&json!("cpt_post")));
    assert!(ctx.get("cpt_type_slug").is_none());
}

#[tokio::test]
async fn type_delete_refuses_dependents_and_cleans_links() {
    let (db, _) = setup().await;
    let blog = create_type(&db, "Blog", "blog").await;
    let post = create_post(&db, blog.id, "Hello", "hello").await;

    let types = CptTypeRepository::new(&db);
    let err = types.delete(blog.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    CptPostRepository::new(&db).delete(post.id).await.expect("delete post");
    types.delete(blog.id).await.expect("delete type");
    assert!(types.find(blog.id).await.unwrap().is_none());
}

#[tokio::test]
async fn type_group_attachments_keep_their_order() {
    let (db, _) = setup().await;
    let blog = create_type(&db, "Blog", "blog").await;

    let groups = FieldGroupRepository::new(&db);
    let mut ids = Vec::new();
    for slug in ["alpha", "beta", "gamma"] {
        let group = groups
            .save(
                GroupInput {
                    title: slug.to_uppercase(),
                    slug: Some(slug.into()),
                    active: true,
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        ids.push(group.id);
    }

    let types = CptTypeRepository::new(&db);
    types
        .sync_groups(blog.id, &[ids[2], ids[0]])
        .await
        .expect("sync groups");
    let attached = types.groups(blog.id).await.unwrap();
    let slugs: Vec<&str> = attached.iter().map(|g| g.slug.as_str()).collect();
    assert_eq!(slugs, vec!["gamma", "alpha"]);

    types
        .sync_groups(blog.id, &[ids[1]])
        .await
        .expect("replace groups");
    let attached = types.groups(blog.id).await.unwrap();
    let slugs: Vec<&str> = attached.iter().map(|g| g.slug.as_str()).collect();
    assert_eq!(slugs, vec!["beta"]);
}

#[tokio::test]
async fn post_terms_sync_replaces_the_set() {
    let (db, _) = setup().await;
    let blog = create_type(&db, "Blog", "blog").await;
    let post = create_post(&db, blog.id, "Hello", "hello").await;

    let taxonomy = CptTaxonomyRepository::new(&db)
        .save(
            CptTaxonomyInput {
                name: "Topics".into(),
                slug: Some("topics".into()),
                active: true,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    let terms_repo = CptTermRepository::new(&db);
    let mut term_ids = Vec::new();
    for name in ["One", "Two"] {
        let term = terms_repo
            .save(
                CptTermInput {
                    taxonomy_id: taxonomy.id,
                    name: name.into(),
                    active: true,
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        term_ids.push(term.id);
    }

    let posts = CptPostRepository::new(&db);
    posts.sync_terms(post.id, &term_ids).await.expect("sync terms");
    assert_eq!(posts.terms(post.id).await.unwrap().len(), 2);

    posts.sync_terms(post.id, &term_ids[..1]).await.expect("re-sync");
    let remaining = posts.terms(post.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, term_ids[0]);
}
