use engine::EngineError;
use engine::entity::{field, field_value};
use engine::location::RuleContext;
use engine::repository::groups::{FieldGroupRepository, GroupInput, GroupListQuery};
use engine::repository::values::{ENTITY_PRODUCT, ValueStore, ValueWrite};
use engine::repository::FieldRepository;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use crate::common::{create_child_field, create_field, create_group, setup};

#[tokio::test]
async fn group_slugs_are_globally_unique() {
    let (db, _) = setup().await;
    let repo = FieldGroupRepository::new(&db);

    let first = create_group(&db, "Specs", "specs").await;
    let err = repo
        .save(
            GroupInput {
                title: "Other".into(),
                slug: Some("specs".into()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    // A group keeps its own slug on update, conflicting only with itself.
    let updated = repo
        .save(
            GroupInput {
                title: "Specs v2".into(),
                slug: Some("specs".into()),
                active: true,
                ..Default::default()
            },
            Some(first.id),
        )
        .await
        .expect("update with own slug");
    assert_eq!(updated.slug, "specs");
    assert_eq!(updated.title, "Specs v2");
}

#[tokio::test]
async fn slug_falls_back_to_title_then_synthesized() {
    let (db, _) = setup().await;
    let repo = FieldGroupRepository::new(&db);

    let from_title = repo
        .save(
            GroupInput {
                title: "Product  Specs!".into(),
                ..Default::default()
            },
            None,
        )
        .await
        .expect("save");
    assert_eq!(from_title.slug, "product_specs");

    // Title survives validation but degenerates to an empty slug.
    let synthesized = repo
        .save(
            GroupInput {
                title: "!!!".into(),
                ..Default::default()
            },
            None,
        )
        .await
        .expect("save");
    assert!(synthesized.slug.starts_with("group_"));
}

#[tokio::test]
async fn duplicate_copies_fields_inactive_with_fresh_slugs() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    for (title, slug) in [("Material", "material"), ("Weight", "weight"), ("Origin", "origin")] {
        create_field(&db, &registry, group.id, "text", title, slug, false).await;
    }

    let repo = FieldGroupRepository::new(&db);
    let copy = repo.duplicate(group.id).await.expect("duplicate");

    assert_ne!(copy.slug, group.slug);
    assert!(!copy.active);
    assert_ne!(copy.uuid, group.uuid);

    let original_fields = FieldRepository::new(&db)
        .find_by_group(group.id)
        .await
        .unwrap();
    let copied_fields = FieldRepository::new(&db)
        .find_by_group(copy.id)
        .await
        .unwrap();
    assert_eq!(copied_fields.len(), 3);

    for (original, copied) in original_fields.iter().zip(&copied_fields) {
        assert_ne!(copied.slug, original.slug);
        assert_eq!(copied.title, original.title);
        assert_eq!(copied.field_type, original.field_type);
        assert_eq!(copied.config, original.config);
        assert_eq!(copied.position, original.position);
    }
}

#[tokio::test]
async fn duplicate_twice_re_uniquifies() {
    let (db, _) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let repo = FieldGroupRepository::new(&db);

    let first = repo.duplicate(group.id).await.expect("first copy");
    let second = repo.duplicate(group.id).await.expect("second copy");
    assert_eq!(first.slug, "specs_copy");
    assert_eq!(second.slug, "specs_copy_2");
}

#[tokio::test]
async fn delete_cascades_to_fields_children_and_values() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let repeater =
        create_field(&db, &registry, group.id, "repeater", "Sizes", "sizes", false).await;
    let child = create_child_field(&db, &registry, repeater.id, "text", "Label", "label").await;

    ValueStore::new(&db, 1)
        .save(ValueWrite::new(
            child.id,
            ENTITY_PRODUCT,
            1,
            1,
            json!("M"),
        ))
        .await
        .unwrap();

    FieldGroupRepository::new(&db)
        .delete(group.id)
        .await
        .expect("delete group");

    assert_eq!(field::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(field_value::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn matching_honors_rules_and_global_scope() {
    let (db, _) = setup().await;
    let repo = FieldGroupRepository::new(&db);

    repo.save(
        GroupInput {
            title: "Everywhere".into(),
            slug: Some("everywhere".into()),
            active: true,
            ..Default::default()
        },
        None,
    )
    .await
    .unwrap();
    repo.save(
        GroupInput {
            title: "Products only".into(),
            slug: Some("products_only".into()),
            location_rules: json!({ "==": [{ "var": "entity_type" }, "product"] }),
            active: true,
            ..Default::default()
        },
        None,
    )
    .await
    .unwrap();
    repo.save(
        GroupInput {
            title: "Global settings".into(),
            slug: Some("global_settings".into()),
            bo_options: json!({ "scope": "global" }),
            active: true,
            ..Default::default()
        },
        None,
    )
    .await
    .unwrap();
    repo.save(
        GroupInput {
            title: "Disabled".into(),
            slug: Some("disabled".into()),
            active: false,
            ..Default::default()
        },
        None,
    )
    .await
    .unwrap();

    let mut ctx = RuleContext::new();
    ctx.insert("entity_type".into(), json!("product"));

    let matched = repo.matching(&ctx, true).await.expect("matching");
    let slugs: Vec<&str> = matched.iter().map(|g| g.slug.as_str()).collect();
    assert_eq!(slugs, vec!["everywhere", "products_only"]);

    // Global groups are only excluded for per-entity matching.
    let with_global = repo.matching(&ctx, false).await.expect("matching");
    assert_eq!(with_global.len(), 3);

    let mut category_ctx = RuleContext::new();
    category_ctx.insert("entity_type".into(), json!("category"));
    let matched = repo.matching(&category_ctx, true).await.expect("matching");
    let slugs: Vec<&str> = matched.iter().map(|g| g.slug.as_str()).collect();
    assert_eq!(slugs, vec!["everywhere"]);
}

#[tokio::test]
async fn list_searches_and_paginates() {
    let (db, _) = setup().await;
    let repo = FieldGroupRepository::new(&db);
    for i in 0..5 {
        create_group(&db, &format!("Spec sheet {i}"), &format!("specs_{i}")).await;
    }
    create_group(&db, "Shipping", "shipping").await;

    let page = repo
        .list(&GroupListQuery {
            search: Some("spec".into()),
            per_page: Some(3),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.pagination.total_pages, 2);
    assert_eq!(page.data.len(), 3);

    // LIKE wildcards in the needle are escaped, not interpreted.
    let page = repo
        .list(&GroupListQuery {
            search: Some("%".into()),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(page.pagination.total, 0);
}

#[tokio::test]
async fn missing_group_is_not_found() {
    let (db, _) = setup().await;
    let err = FieldGroupRepository::new(&db).get(9999).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    let err = FieldGroupRepository::new(&db).delete(9999).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}
