use engine::EngineError;
use engine::repository::FieldRepository;
use engine::repository::fields::FieldInput;
use serde_json::json;

use crate::common::{create_child_field, create_field, create_group, setup};

#[tokio::test]
async fn field_slugs_are_unique_within_group_only() {
    let (db, registry) = setup().await;
    let specs = create_group(&db, "Specs", "specs").await;
    let seo = create_group(&db, "SEO", "seo").await;

    create_field(&db, &registry, specs.id, "text", "Title", "title", false).await;
    // Same slug in a different group is fine.
    create_field(&db, &registry, seo.id, "text", "Title", "title", false).await;

    let err = FieldRepository::new(&db)
        .save(
            &registry,
            FieldInput {
                group_id: Some(specs.id),
                field_type: "text".into(),
                title: "Title again".into(),
                slug: Some("title".into()),
                active: true,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn unknown_field_type_is_rejected() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;

    let err = FieldRepository::new(&db)
        .save(
            &registry,
            FieldInput {
                group_id: Some(group.id),
                field_type: "hologram".into(),
                title: "Nope".into(),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn translatable_flag_respects_type_capability() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;

    // Relations point at entities; one id set serves every language.
    let err = FieldRepository::new(&db)
        .save(
            &registry,
            FieldInput {
                group_id: Some(group.id),
                field_type: "relation".into(),
                title: "Related".into(),
                translatable: true,
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn repeater_children_are_one_level_deep() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let repeater =
        create_field(&db, &registry, group.id, "repeater", "Sizes", "sizes", false).await;
    let label = create_child_field(&db, &registry, repeater.id, "text", "Label", "label").await;

    let repo = FieldRepository::new(&db);

    // Children never appear in the top-level listing.
    let tops = repo.find_by_group(group.id).await.unwrap();
    assert_eq!(tops.len(), 1);
    assert_eq!(tops[0].id, repeater.id);

    let children = repo.find_by_parent(repeater.id).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].parent_id, Some(repeater.id));

    // A repeater cannot hang under a repeater.
    let err = repo
        .save(
            &registry,
            FieldInput {
                parent_id: Some(repeater.id),
                field_type: "repeater".into(),
                title: "Nested".into(),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // Nor can anything hang under a non-repeater.
    let err = repo
        .save(
            &registry,
            FieldInput {
                parent_id: Some(label.id),
                field_type: "text".into(),
                title: "Grandchild".into(),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn ownership_must_be_exactly_one_scope() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let repeater =
        create_field(&db, &registry, group.id, "repeater", "Sizes", "sizes", false).await;

    let repo = FieldRepository::new(&db);
    let err = repo
        .save(
            &registry,
            FieldInput {
                field_type: "text".into(),
                title: "Orphan".into(),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = repo
        .save(
            &registry,
            FieldInput {
                group_id: Some(group.id),
                parent_id: Some(repeater.id),
                field_type: "text".into(),
                title: "Both".into(),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn positions_auto_increment_and_reorder() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let a = create_field(&db, &registry, group.id, "text", "A", "a", false).await;
    let b = create_field(&db, &registry, group.id, "text", "B", "b", false).await;
    let c = create_field(&db, &registry, group.id, "text", "C", "c", false).await;
    assert_eq!((a.position, b.position, c.position), (0, 1, 2));

    let repo = FieldRepository::new(&db);
    repo.reorder(group.id, &[c.id, a.id, b.id]).await.expect("reorder");

    let ordered = repo.find_by_group(group.id).await.unwrap();
    let ids: Vec<i32> = ordered.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![c.id, a.id, b.id]);

    // The id set must match the group exactly.
    let err = repo.reorder(group.id, &[a.id, b.id]).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn dtos_nest_children_under_repeaters_only() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let repeater =
        create_field(&db, &registry, group.id, "repeater", "Sizes", "sizes", false).await;
    create_child_field(&db, &registry, repeater.id, "text", "Label", "label").await;
    create_field(&db, &registry, group.id, "text", "Material", "material", false).await;

    let dto = engine::repository::FieldGroupRepository::new(&db)
        .dto(group.id)
        .await
        .expect("group dto");
    let group_json = serde_json::to_value(&dto).unwrap();
    assert_eq!(group_json["slug"], "specs");
    assert!(group_json["locationRules"].is_null());

    let dtos = dto.fields;
    assert_eq!(dtos.len(), 2);

    let as_json = serde_json::to_value(&dtos).unwrap();
    let repeater_json = as_json
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["type"] == "repeater")
        .unwrap();
    assert_eq!(repeater_json["children"].as_array().unwrap().len(), 1);
    let text_json = as_json
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["type"] == "text")
        .unwrap();
    assert!(text_json.get("children").is_none());
}

#[tokio::test]
async fn translation_upsert_is_idempotent() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let field = create_field(&db, &registry, group.id, "text", "Material", "material", true).await;

    let repo = FieldRepository::new(&db);
    repo.upsert_translation(field.id, 2, "Matière", None)
        .await
        .expect("insert translation");
    repo.upsert_translation(field.id, 2, "Matériau", Some("en français"))
        .await
        .expect("update translation");

    let translations = repo.translations(field.id).await.unwrap();
    assert_eq!(translations.len(), 1);
    assert_eq!(translations[0].title, "Matériau");
    assert_eq!(translations[0].instructions.as_deref(), Some("en français"));
}

#[tokio::test]
async fn delete_field_removes_children_and_values() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let repeater =
        create_field(&db, &registry, group.id, "repeater", "Sizes", "sizes", false).await;
    create_child_field(&db, &registry, repeater.id, "text", "Label", "label").await;

    let repo = FieldRepository::new(&db);
    repo.delete(repeater.id).await.expect("delete repeater");

    assert!(repo.find(repeater.id).await.unwrap().is_none());
    assert!(repo.find_by_group(group.id).await.unwrap().is_empty());

    // The owning group itself is untouched.
    assert!(
        engine::repository::FieldGroupRepository::new(&db)
            .find(group.id)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn field_config_round_trips_as_json() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let config = json!({
        "choices": [{ "value": "m", "label": "Medium" }],
        "multiple": true,
    });

    let saved = FieldRepository::new(&db)
        .save(
            &registry,
            FieldInput {
                group_id: Some(group.id),
                field_type: "select".into(),
                title: "Size".into(),
                config: config.clone(),
                validation: json!({ "required": true }),
                active: true,
                ..Default::default()
            },
            None,
        )
        .await
        .expect("save field");

    let loaded = FieldRepository::new(&db).get(saved.id).await.unwrap();
    assert_eq!(loaded.config, config);
    assert_eq!(loaded.validation, json!({ "required": true }));
}
