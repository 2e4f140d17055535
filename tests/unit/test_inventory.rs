use bisync::core::config::Credentials;
use bisync::core::inventory::{ApplicationRecord, BiConfig, Inventory, Lookup, StoredBiConfig};
use bisync::core::types::ExportStatus;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_creates_empty_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("applications-testing.json");

    let inventory = Inventory::load(&path).unwrap();
    assert!(inventory.is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
}

#[test]
fn test_existing_inventory_keeps_order_and_markers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("applications-production.json");
    let raw = r#"{"zeta":{"lime_bi_config":"Missing","app_user_username":"Missing","app_user_password":"Missing","export_status":"failed"},"alpha":{"lime_bi_config":{"collection_id":3,"group_id":4,"database_id":5},"app_user_username":"bi_alpha","app_user_password":"pw"}}"#;
    fs::write(&path, raw).unwrap();

    let inventory = Inventory::load(&path).unwrap();
    assert_eq!(inventory.identifiers(), vec!["zeta", "alpha"]);

    let zeta = inventory.get("zeta").unwrap();
    assert_eq!(zeta.lime_bi_config, Some(Lookup::Missing));
    assert_eq!(zeta.export_status, Some(ExportStatus::Failed));
    assert!(zeta.app_user().is_none());

    let alpha = inventory.get("alpha").unwrap();
    assert_eq!(alpha.bi_config().unwrap().database_id, 5);
    assert_eq!(alpha.app_user().unwrap().username, "bi_alpha");
    assert!(alpha.export_status.is_none());

    inventory.save().unwrap();
    let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let original: Value = serde_json::from_str(raw).unwrap();
    assert_eq!(saved, original);
}

#[test]
fn test_entry_inserts_and_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/applications-testing.json");

    let mut inventory = Inventory::load(&path).unwrap();
    let record = inventory.entry("acme");
    record.lime_bi_config = BiConfig::from_value(json!({
        "collection_id": 1,
        "group_id": 2,
        "database_id": 3,
        "group_name": "acme"
    }))
    .map(|bi| Lookup::Found(bi.into()));
    record.set_app_user(Some(Credentials {
        username: "bi_acme".to_string(),
        password: "secret".to_string(),
    }));
    record.export_status = Some(ExportStatus::Succeeded);
    inventory.save().unwrap();

    let reloaded = Inventory::load(&path).unwrap();
    assert_eq!(reloaded.len(), 1);
    let record: &ApplicationRecord = reloaded.get("acme").unwrap();
    assert_eq!(record.bi_config().unwrap().group_name.as_deref(), Some("acme"));
    assert_eq!(record.export_status, Some(ExportStatus::Succeeded));

    let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["acme"]["export_status"], "succeeded");
    assert_eq!(saved["acme"]["app_user_password"], "secret");
}

#[test]
fn test_legacy_bi_config_without_ids_still_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("applications-production.json");
    let raw = r#"{"a1":{"lime_bi_config":{"unique_identifier":"acme","is_initialized":false},"app_user_username":"bi_a1","app_user_password":"pw"},"b2":{"lime_bi_config":{"collection_id":3,"group_id":4,"database_id":5}}}"#;
    fs::write(&path, raw).unwrap();

    let inventory = Inventory::load(&path).unwrap();
    let legacy = inventory.get("a1").unwrap();
    assert!(matches!(
        legacy.lime_bi_config,
        Some(Lookup::Found(StoredBiConfig::Raw(_)))
    ));
    assert!(legacy.bi_config().is_none());
    assert!(legacy.app_user().is_some());
    assert_eq!(inventory.get("b2").unwrap().bi_config().unwrap().group_id, 4);

    inventory.save().unwrap();
    let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let original: Value = serde_json::from_str(raw).unwrap();
    assert_eq!(saved, original);
}

#[test]
fn test_corrupt_inventory_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("applications-testing.json");
    fs::write(&path, "[not an object").unwrap();

    let err = Inventory::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("applications-testing.json"));
}
