use engine::repository::groups::FieldGroupRepository;
use engine::repository::FieldRepository;
use engine::sync::{ImportMode, SyncService};
use serde_json::json;

use crate::common::{create_child_field, create_field, create_group, setup};

#[tokio::test]
async fn export_import_round_trips_a_group() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    create_field(&db, &registry, group.id, "text", "Material", "material", true).await;
    let repeater =
        create_field(&db, &registry, group.id, "repeater", "Sizes", "sizes", false).await;
    create_child_field(&db, &registry, repeater.id, "text", "Label", "label").await;

    let sync = SyncService::new(&db);
    let export = sync.export_group("specs").await.expect("export");
    assert_eq!(export.fields.len(), 2);

    FieldGroupRepository::new(&db)
        .delete(group.id)
        .await
        .expect("wipe group");

    let report = sync
        .import_groups(&registry, vec![export.clone()], ImportMode::Merge)
        .await
        .expect("import");
    assert_eq!(report.created, vec!["specs".to_string()]);
    assert!(report.skipped.is_empty());

    // Round trip: exporting again yields the same definition.
    let re_export = sync.export_group("specs").await.expect("re-export");
    assert_eq!(
        serde_json::to_value(&re_export).unwrap(),
        serde_json::to_value(&export).unwrap()
    );
}

#[tokio::test]
async fn merge_keeps_existing_groups() {
    let (db, registry) = setup().await;
    create_group(&db, "Specs", "specs").await;

    let sync = SyncService::new(&db);
    let mut export = sync.export_group("specs").await.unwrap();
    export.title = "Hijacked".into();

    let report = sync
        .import_groups(&registry, vec![export], ImportMode::Merge)
        .await
        .expect("import");
    assert!(report.created.is_empty());
    assert_eq!(report.skipped.len(), 1);

    let existing = FieldGroupRepository::new(&db)
        .find_by_slug("specs")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(existing.title, "Specs");
}

#[tokio::test]
async fn replace_overwrites_group_and_fields() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    create_field(&db, &registry, group.id, "text", "Old field", "old_field", false).await;

    let sync = SyncService::new(&db);
    let mut export = sync.export_group("specs").await.unwrap();
    export.title = "Specs v2".into();
    export.fields[0].title = "New field".into();
    export.fields[0].slug = "new_field".into();

    let report = sync
        .import_groups(&registry, vec![export], ImportMode::Replace)
        .await
        .expect("import");
    assert_eq!(report.replaced, vec!["specs".to_string()]);

    let replaced = FieldGroupRepository::new(&db)
        .find_by_slug("specs")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(replaced.title, "Specs v2");

    let fields = FieldRepository::new(&db)
        .find_by_group(replaced.id)
        .await
        .unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].slug, "new_field");
}

#[tokio::test]
async fn unknown_field_types_are_skipped_per_field() {
    let (db, registry) = setup().await;

    let export = serde_json::from_value(json!({
        "slug": "partial",
        "title": "Partially importable",
        "fields": [
            { "type": "text", "title": "Fine", "slug": "fine" },
            { "type": "star_rating", "title": "Custom", "slug": "stars" },
        ],
    }))
    .expect("parse export");

    let sync = SyncService::new(&db);
    let report = sync
        .import_groups(&registry, vec![export], ImportMode::Merge)
        .await
        .expect("import");

    assert_eq!(report.created, vec!["partial".to_string()]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, "stars");

    let group = FieldGroupRepository::new(&db)
        .find_by_slug("partial")
        .await
        .unwrap()
        .unwrap();
    let fields = FieldRepository::new(&db).find_by_group(group.id).await.unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].slug, "fine");
}

#[tokio::test]
async fn directory_round_trip_writes_one_file_per_group() {
    let (db, registry) = setup().await;
    let group = create_group(&db, "Specs", "specs").await;
    create_field(&db, &registry, group.id, "text", "Material", "material", false).await;
    create_group(&db, "SEO", "seo").await;

    let dir = tempfile::tempdir().expect("tempdir");
    let sync = SyncService::new(&db);
    let written = sync.write_dir(dir.path()).await.expect("write dir");
    assert_eq!(written, 2);
    assert!(dir.path().join("specs.json").exists());
    assert!(dir.path().join("seo.json").exists());

    // A second store imports the whole directory.
    let (other_db, _) = setup().await;
    let report = SyncService::new(&other_db)
        .import_dir(&registry, dir.path(), ImportMode::Merge)
        .await
        .expect("import dir");
    assert_eq!(report.created.len(), 2);

    let imported = FieldGroupRepository::new(&other_db)
        .find_by_slug("specs")
        .await
        .unwrap()
        .unwrap();
    let fields = FieldRepository::new(&other_db)
        .find_by_group(imported.id)
        .await
        .unwrap();
    assert_eq!(fields.len(), 1);
}
