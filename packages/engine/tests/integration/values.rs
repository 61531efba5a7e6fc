use engine::entity::field_value;
use engine::repository::values::{ENTITY_PRODUCT, ValueStore, ValueWrite};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use crate::common::{create_field, create_group, setup};

const SHOP: i32 = 1;

#[tokio::test]
async fn non_translatable_value_round_trips_per_entity() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let field = create_field(&db, &registry, group.id, "text", "Material", "material", false).await;

    let store = ValueStore::new(&db, 1);
    store
        .save(ValueWrite::new(
            field.id,
            ENTITY_PRODUCT,
            42,
            SHOP,
            json!("Cotton"),
        ))
        .await
        .expect("save value");

    let loaded = store
        .find_value(field.id, ENTITY_PRODUCT, 42, SHOP, None)
        .await
        .expect("load value");
    assert_eq!(loaded, Some(json!("Cotton")));

    let other_entity = store
        .find_value(field.id, ENTITY_PRODUCT, 43, SHOP, None)
        .await
        .expect("load other entity");
    assert_eq!(other_entity, None);
}

#[tokio::test]
async fn non_translatable_save_is_exclusive() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let field = create_field(&db, &registry, group.id, "text", "Material", "material", false).await;

    let store = ValueStore::new(&db, 1);
    for value in ["Cotton", "Wool"] {
        store
            .save(ValueWrite::new(
                field.id,
                ENTITY_PRODUCT,
                42,
                SHOP,
                json!(value),
            ))
            .await
            .expect("save value");
    }

    // Exactly one NULL-lang row afterwards: never two, never zero.
    let rows = field_value::Entity::find()
        .filter(field_value::Column::FieldId.eq(field.id))
        .filter(field_value::Column::EntityId.eq(42))
        .filter(field_value::Column::ShopId.eq(SHOP))
        .filter(field_value::Column::LangId.is_null())
        .count(&db)
        .await
        .expect("count rows");
    assert_eq!(rows, 1);

    let loaded = store
        .find_value(field.id, ENTITY_PRODUCT, 42, SHOP, None)
        .await
        .expect("load value");
    assert_eq!(loaded, Some(json!("Wool")));
}

#[tokio::test]
async fn translatable_languages_are_isolated() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let field = create_field(&db, &registry, group.id, "text", "Headline", "headline", true).await;

    let store = ValueStore::new(&db, 1);
    store
        .save(ValueWrite::new(field.id, ENTITY_PRODUCT, 1, SHOP, json!("Hello")).lang(1))
        .await
        .expect("save en");
    store
        .save(ValueWrite::new(field.id, ENTITY_PRODUCT, 1, SHOP, json!("Bonjour")).lang(2))
        .await
        .expect("save fr");

    assert_eq!(
        store
            .find_value(field.id, ENTITY_PRODUCT, 1, SHOP, Some(1))
            .await
            .unwrap(),
        Some(json!("Hello"))
    );
    assert_eq!(
        store
            .find_value(field.id, ENTITY_PRODUCT, 1, SHOP, Some(2))
            .await
            .unwrap(),
        Some(json!("Bonjour"))
    );

    // Updating one language must not alter the other.
    store
        .save(ValueWrite::new(field.id, ENTITY_PRODUCT, 1, SHOP, json!("Hi")).lang(1))
        .await
        .expect("update en");
    assert_eq!(
        store
            .find_value(field.id, ENTITY_PRODUCT, 1, SHOP, Some(2))
            .await
            .unwrap(),
        Some(json!("Bonjour"))
    );

    let rows = field_value::Entity::find()
        .filter(field_value::Column::FieldId.eq(field.id))
        .count(&db)
        .await
        .expect("count rows");
    assert_eq!(rows, 2);
}

#[tokio::test]
async fn translatable_save_upserts_single_row_per_language() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let field = create_field(&db, &registry, group.id, "text", "Headline", "headline", true).await;

    let store = ValueStore::new(&db, 1);
    for value in ["One", "Two", "Three"] {
        store
            .save(ValueWrite::new(field.id, ENTITY_PRODUCT, 1, SHOP, json!(value)).lang(1))
            .await
            .expect("save");
    }

    let rows = field_value::Entity::find()
        .filter(field_value::Column::FieldId.eq(field.id))
        .count(&db)
        .await
        .expect("count rows");
    assert_eq!(rows, 1);
    assert_eq!(
        store
            .find_value(field.id, ENTITY_PRODUCT, 1, SHOP, Some(1))
            .await
            .unwrap(),
        Some(json!("Three"))
    );
}

#[tokio::test]
async fn newest_row_wins_between_language_and_shared() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let field = create_field(&db, &registry, group.id, "text", "Headline", "headline", true).await;

    let store = ValueStore::new(&db, 1);

    // A shared row left over from when the field was non-translatable.
    let mut shared = ValueWrite::new(field.id, ENTITY_PRODUCT, 1, SHOP, json!("Shared"));
    shared.translatable = Some(false);
    store.save(shared).await.expect("save shared");

    store
        .save(ValueWrite::new(field.id, ENTITY_PRODUCT, 1, SHOP, json!("English")).lang(1))
        .await
        .expect("save lang");

    // Both candidates match (lang = 1 OR lang IS NULL); the row inserted
    // last has the larger primary key and wins.
    assert_eq!(
        store
            .find_value(field.id, ENTITY_PRODUCT, 1, SHOP, Some(1))
            .await
            .unwrap(),
        Some(json!("English"))
    );

    let mut shared_again = ValueWrite::new(field.id, ENTITY_PRODUCT, 1, SHOP, json!("Newer"));
    shared_again.translatable = Some(false);
    store.save(shared_again).await.expect("save shared again");

    assert_eq!(
        store
            .find_value(field.id, ENTITY_PRODUCT, 1, SHOP, Some(1))
            .await
            .unwrap(),
        Some(json!("Newer"))
    );
}

#[tokio::test]
async fn find_for_entity_returns_latest_per_field() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let material =
        create_field(&db, &registry, group.id, "text", "Material", "material", false).await;
    let headline =
        create_field(&db, &registry, group.id, "text", "Headline", "headline", true).await;

    let store = ValueStore::new(&db, 1);
    store
        .save(ValueWrite::new(
            material.id,
            ENTITY_PRODUCT,
            1,
            SHOP,
            json!("Cotton"),
        ))
        .await
        .unwrap();
    store
        .save(ValueWrite::new(headline.id, ENTITY_PRODUCT, 1, SHOP, json!("Hello")).lang(1))
        .await
        .unwrap();
    store
        .save(ValueWrite::new(headline.id, ENTITY_PRODUCT, 1, SHOP, json!("Bonjour")).lang(2))
        .await
        .unwrap();

    let rows = store
        .find_for_entity(ENTITY_PRODUCT, 1, SHOP, Some(1))
        .await
        .expect("find for entity");
    assert_eq!(rows.len(), 2);
    let headline_row = rows.iter().find(|r| r.field_id == headline.id).unwrap();
    assert_eq!(headline_row.lang_id, Some(1));
}

#[tokio::test]
async fn with_meta_renders_through_the_registry() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let size = engine::repository::FieldRepository::new(&db)
        .save(
            &registry,
            engine::repository::fields::FieldInput {
                group_id: Some(group.id),
                field_type: "select".into(),
                title: "Size".into(),
                slug: Some("size".into()),
                config: json!({
                    "choices": [
                        { "value": "m", "label": "Medium" },
                        { "value": "l", "label": "Large" },
                    ],
                }),
                active: true,
                ..Default::default()
            },
            None,
        )
        .await
        .expect("create select field");

    let store = ValueStore::new(&db, 1);
    store
        .save(ValueWrite::new(size.id, ENTITY_PRODUCT, 1, SHOP, json!("m")).lang(1))
        .await
        .unwrap();

    let with_meta = store
        .find_for_entity_with_meta(&registry, ENTITY_PRODUCT, 1, SHOP, Some(1))
        .await
        .expect("with meta");
    assert_eq!(with_meta.len(), 1);
    assert_eq!(with_meta[0].value, json!("m"));
    assert_eq!(with_meta[0].rendered, "Medium");
}

#[tokio::test]
async fn reverse_lookup_matches_value_index() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let field = create_field(&db, &registry, group.id, "text", "Material", "material", false).await;

    let store = ValueStore::new(&db, 1);
    for (entity, value) in [(1, "Cotton"), (2, "Cotton"), (3, "Wool")] {
        store
            .save(ValueWrite::new(
                field.id,
                ENTITY_PRODUCT,
                entity,
                SHOP,
                json!(value),
            ))
            .await
            .unwrap();
    }

    let mut found = store
        .find_entities_by_value(field.id, ENTITY_PRODUCT, &json!("Cotton"), SHOP)
        .await
        .expect("reverse lookup");
    found.sort_unstable();
    assert_eq!(found, vec![1, 2]);

    let in_other_shop = store
        .find_entities_by_value(field.id, ENTITY_PRODUCT, &json!("Cotton"), 9)
        .await
        .expect("reverse lookup other shop");
    assert!(in_other_shop.is_empty());
}

#[tokio::test]
async fn reverse_lookup_survives_index_truncation() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let field = create_field(&db, &registry, group.id, "textarea", "Blurb", "blurb", false).await;

    let long_value = "x".repeat(300);
    let store = ValueStore::new(&db, 1);
    store
        .save(ValueWrite::new(
            field.id,
            ENTITY_PRODUCT,
            7,
            SHOP,
            json!(long_value),
        ))
        .await
        .unwrap();

    // Both sides of the comparison are truncated to 255 characters.
    let found = store
        .find_entities_by_value(field.id, ENTITY_PRODUCT, &json!(long_value), SHOP)
        .await
        .expect("reverse lookup");
    assert_eq!(found, vec![7]);
}

#[tokio::test]
async fn bulk_deletes_scope_correctly() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    let a = create_field(&db, &registry, group.id, "text", "A", "a", false).await;
    let b = create_field(&db, &registry, group.id, "text", "B", "b", false).await;

    let store = ValueStore::new(&db, 1);
    for (field_id, entity) in [(a.id, 1), (a.id, 2), (b.id, 1)] {
        store
            .save(ValueWrite::new(
                field_id,
                ENTITY_PRODUCT,
                entity,
                SHOP,
                json!("v"),
            ))
            .await
            .unwrap();
    }

    assert_eq!(store.delete_by_field(a.id).await.unwrap(), 2);
    assert_eq!(store.delete_by_entity(ENTITY_PRODUCT, 1).await.unwrap(), 1);
    let remaining = field_value::Entity::find().count(&db).await.unwrap();
    assert_eq!(remaining, 0);
}
