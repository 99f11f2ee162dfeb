//! Unit tests for the one-shot legacy store migration.

use mediastash::database::Database;
use mediastash::managers::download_registry::{DownloadRegistry, DownloadRegistryTrait};
use mediastash::services::legacy_migration::{
    self, CURRENT_MIGRATION_VERSION, LEGACY_STORE_KEY, MIGRATION_VERSION_KEY,
};
use mediastash::types::download::DownloadStatus;
use serde_json::json;

/// Legacy blob with downloads persisted as a native JSON map, the way
/// the pre-split client stored them.
fn legacy_blob() -> String {
    json!({
        "state": {
            "downloads": {
                "s1-i1": {
                    "itemId": "i1",
                    "serverId": "s1",
                    "title": "Old Movie",
                    "serverUrl": "https://media.example",
                    "apiKey": "k",
                    "filename": "old.mp4",
                    "downloadUrl": "d",
                    "isNew": false,
                    "isComplete": true,
                },
            },
            "servers": [{ "url": "https://media.example" }],
            "settings": { "theme": "dark" },
        },
        "version": 0
    })
    .to_string()
}

#[test]
fn test_gate_skips_without_legacy_blob() {
    let db = Database::open_in_memory().unwrap();
    let report = legacy_migration::run(&db).unwrap();

    assert!(!report.applied);
    assert!(report.converted.is_empty());
    assert_eq!(db.get_item(MIGRATION_VERSION_KEY).unwrap(), None);
}

#[test]
fn test_gate_skips_when_version_current() {
    let db = Database::open_in_memory().unwrap();
    db.set_item(LEGACY_STORE_KEY, &legacy_blob()).unwrap();
    db.set_item(MIGRATION_VERSION_KEY, &CURRENT_MIGRATION_VERSION.to_string())
        .unwrap();

    let report = legacy_migration::run(&db).unwrap();
    assert!(!report.applied);
    assert!(report.converted.is_empty());
}

// Scenario C: a minimal-identity legacy entry becomes a record with a
// reconstructed item, the version advances, and a second launch inserts
// nothing new.
#[test]
fn test_migration_converts_and_is_idempotent() {
    let db = Database::open_in_memory().unwrap();
    db.set_item(LEGACY_STORE_KEY, &legacy_blob()).unwrap();

    let report = legacy_migration::run(&db).unwrap();
    assert!(report.applied);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.converted.len(), 1);

    let record = &report.converted[0];
    assert_eq!(record.key, "s1-i1");
    assert_eq!(record.item.id, "i1");
    assert_eq!(record.item.server_id, "s1");
    assert_eq!(record.item.name, "Old Movie");
    assert_eq!(record.status, DownloadStatus::Complete);

    assert_eq!(
        db.get_item(MIGRATION_VERSION_KEY).unwrap().as_deref(),
        Some(CURRENT_MIGRATION_VERSION.to_string().as_str())
    );

    // Second pass against the same blob: gate closed, zero conversions.
    let second = legacy_migration::run(&db).unwrap();
    assert!(!second.applied);
    assert!(second.converted.is_empty());
}

#[test]
fn test_bad_entries_are_isolated_and_version_still_advances() {
    let db = Database::open_in_memory().unwrap();
    let blob = json!({
        "state": {
            "downloads": {
                "bad-shape": "not-an-object",
                "no-identity": {
                    "serverUrl": "u", "apiKey": "k",
                    "filename": "f", "downloadUrl": "d", "isNew": true,
                },
                "s1-i1": {
                    "itemId": "i1", "serverId": "s1",
                    "serverUrl": "u", "apiKey": "k",
                    "filename": "good.mp4", "downloadUrl": "d", "isNew": true,
                },
            },
        },
        "version": 0
    })
    .to_string();
    db.set_item(LEGACY_STORE_KEY, &blob).unwrap();

    let report = legacy_migration::run(&db).unwrap();
    assert!(report.applied);
    assert_eq!(report.converted.len(), 1);
    assert_eq!(report.converted[0].key, "s1-i1");
    assert_eq!(report.skipped, 2, "bad entries are skipped, not fatal");
    assert_eq!(
        db.get_item(MIGRATION_VERSION_KEY).unwrap().as_deref(),
        Some(CURRENT_MIGRATION_VERSION.to_string().as_str()),
        "skips are permanent: the version advances once the pass completes"
    );
}

#[test]
fn test_corrupt_blob_completes_the_pass() {
    let db = Database::open_in_memory().unwrap();
    db.set_item(LEGACY_STORE_KEY, "{ not json").unwrap();

    let report = legacy_migration::run(&db).unwrap();
    assert!(report.applied);
    assert!(report.converted.is_empty());
    assert_eq!(
        db.get_item(MIGRATION_VERSION_KEY).unwrap().as_deref(),
        Some(CURRENT_MIGRATION_VERSION.to_string().as_str())
    );
}

#[test]
fn test_unparseable_version_counter_reads_as_zero() {
    let db = Database::open_in_memory().unwrap();
    db.set_item(MIGRATION_VERSION_KEY, "garbage").unwrap();
    assert_eq!(legacy_migration::stored_version(&db).unwrap(), 0);
}

#[test]
fn test_registry_open_runs_migration_and_persists() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let db_path = dir.path().join("registry.db");

    {
        let db = Database::open(&db_path).unwrap();
        db.set_item(LEGACY_STORE_KEY, &legacy_blob()).unwrap();
    }

    {
        let db = Database::open(&db_path).unwrap();
        let registry = DownloadRegistry::open(db).unwrap();
        assert_eq!(registry.list().len(), 1);
        assert!(registry.get("s1-i1").is_some());
    }

    // The migrated snapshot was persisted synchronously at startup and
    // the legacy blob is left in place, untouched.
    let db = Database::open(&db_path).unwrap();
    assert!(db
        .get_item(mediastash::services::registry_codec::DOWNLOADS_STORE_KEY)
        .unwrap()
        .is_some());
    assert_eq!(
        db.get_item(LEGACY_STORE_KEY).unwrap().as_deref(),
        Some(legacy_blob().as_str())
    );

    // Relaunch: the registry loads from the new store, no duplicates.
    let registry = DownloadRegistry::open(db).unwrap();
    assert_eq!(registry.list().len(), 1);
}

#[test]
fn test_partial_prior_migration_does_not_duplicate() {
    let db = Database::open_in_memory().unwrap();
    db.set_item(LEGACY_STORE_KEY, &legacy_blob()).unwrap();

    // Simulate a prior attempt that inserted the record but crashed
    // before the version counter was read back on the next launch.
    let snapshot = json!({
        "state": { "downloads": [["s1-i1", {
            "item": { "id": "i1", "serverId": "s1", "name": "Old Movie" },
            "serverUrl": "https://media.example", "apiKey": "k",
            "filename": "old.mp4", "downloadUrl": "d",
            "isNew": false, "status": "Complete",
        }]] },
        "version": 2
    })
    .to_string();
    db.set_item(
        mediastash::services::registry_codec::DOWNLOADS_STORE_KEY,
        &snapshot,
    )
    .unwrap();

    let registry = DownloadRegistry::open(db).unwrap();
    assert_eq!(registry.list().len(), 1, "migration respects uniqueness");
}
