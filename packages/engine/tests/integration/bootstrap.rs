use engine::config::{DatabaseConfig, EngineConfig, LocaleConfig};
use engine::repository::groups::{FieldGroupRepository, GroupInput};
use field_core::DiscoveryConfig;

#[tokio::test]
async fn bootstrap_brings_up_schema_registry_and_indexes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("engine.sqlite");
    let config = EngineConfig {
        database: DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", db_path.display()),
        },
        locale: LocaleConfig {
            default_lang_id: 1,
            default_shop_id: 1,
        },
        discovery: DiscoveryConfig {
            theme_dir: dir.path().join("theme"),
            uploads_dir: dir.path().join("uploads"),
            enable_wasi: false,
        },
    };

    let (db, registry) = engine::bootstrap(&config).await.expect("bootstrap");

    assert!(registry.get("text").is_some());
    assert!(registry.get("repeater").is_some());

    // The synced schema is immediately usable.
    let group = FieldGroupRepository::new(&db)
        .save(
            GroupInput {
                title: "Smoke".into(),
                slug: Some("smoke".into()),
                active: true,
                ..Default::default()
            },
            None,
        )
        .await
        .expect("create group");
    assert_eq!(group.slug, "smoke");
}
