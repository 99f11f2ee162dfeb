//! One-shot conversion of the legacy persisted snapshot.
//!
//! Older client versions kept every logical store inside a single blob,
//! including a raw map of downloads keyed by `server_id-item_id`. This
//! module converts that map into registry records behind a stored
//! version counter: the pass runs only when the counter is behind the
//! current code's version and the legacy blob is present, and the
//! counter is advanced exactly once when the pass completes.
//!
//! Conversion is fail-soft per entry — a record that cannot be
//! reconstructed is logged and skipped, permanently, without aborting
//! its siblings. The legacy blob itself is read-only; current code
//! never rewrites or deletes it.

use serde::Deserialize;

use crate::database::Database;
use crate::services::registry_codec::{self, PersistedRecord};
use crate::types::download::DownloadRecord;
use crate::types::errors::StoreError;

/// Key of the pre-split legacy blob. Never written by current code.
pub const LEGACY_STORE_KEY: &str = "app-storage";

/// Key of the scalar migration version counter, stored independently
/// from the download collection.
pub const MIGRATION_VERSION_KEY: &str = "downloads-migration-version";

/// Version the current code expects. Bump when a new legacy conversion
/// is introduced.
pub const CURRENT_MIGRATION_VERSION: i64 = 1;

#[derive(Deserialize)]
struct LegacyStore {
    state: LegacyState,
}

#[derive(Deserialize)]
struct LegacyState {
    /// The legacy format persisted downloads as a native JSON map.
    #[serde(default)]
    downloads: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of one migration pass.
pub struct MigrationReport {
    /// Records converted from the legacy map, ready for registry insertion.
    pub converted: Vec<DownloadRecord>,
    /// Entries that could not be reconstructed and were dropped.
    pub skipped: usize,
    /// Whether the pass ran (and advanced the stored version).
    pub applied: bool,
}

impl MigrationReport {
    fn skipped_gate() -> Self {
        Self {
            converted: Vec::new(),
            skipped: 0,
            applied: false,
        }
    }
}

/// Reads the stored migration version. Absent or unparseable counters
/// read as 0 (never migrated).
pub fn stored_version(db: &Database) -> Result<i64, StoreError> {
    let raw = db.get_item(MIGRATION_VERSION_KEY)?;
    Ok(raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0))
}

/// Runs the migration gate against the store.
///
/// Skipped (no version write) when the stored version is already
/// current or no legacy blob exists. Otherwise every legacy download
/// entry is converted through the same reconstruction rules the codec
/// applies on load, the version counter is persisted, and the converted
/// records are returned for insertion — the caller inserts them through
/// the registry's `add` so a partially migrated prior run never
/// produces duplicates.
///
/// # Errors
/// Returns `StoreError::Database` only if the storage medium fails;
/// individual bad entries are skipped, not errors.
pub fn run(db: &Database) -> Result<MigrationReport, StoreError> {
    if stored_version(db)? >= CURRENT_MIGRATION_VERSION {
        return Ok(MigrationReport::skipped_gate());
    }
    let Some(blob) = db.get_item(LEGACY_STORE_KEY)? else {
        return Ok(MigrationReport::skipped_gate());
    };

    let mut converted = Vec::new();
    let mut skipped = 0;

    match serde_json::from_str::<LegacyStore>(&blob) {
        Ok(legacy) => {
            for (key, value) in legacy.state.downloads {
                let raw: PersistedRecord = match serde_json::from_value(value) {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "skipping malformed legacy download");
                        skipped += 1;
                        continue;
                    }
                };
                match registry_codec::rehydrate(&key, raw) {
                    Some(record) => converted.push(record),
                    None => skipped += 1,
                }
            }
        }
        Err(e) => {
            // A corrupt blob migrates as zero entries; the pass still
            // completes so it is never retried against the same data.
            tracing::warn!(error = %e, "legacy store unparseable; migrating no entries");
        }
    }

    db.set_item(MIGRATION_VERSION_KEY, &CURRENT_MIGRATION_VERSION.to_string())?;
    tracing::info!(
        converted = converted.len(),
        skipped,
        "legacy download store migrated"
    );

    Ok(MigrationReport {
        converted,
        skipped,
        applied: true,
    })
}
