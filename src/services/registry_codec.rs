//! Association-list codec between the registry and flat-text storage.
//!
//! The durable medium only holds strings, so the keyed collection is
//! flattened into an ordered sequence of `[key, record]` pairs before
//! encoding and rebuilt from it on load. Decoding is lenient per entry:
//! a malformed pair is skipped with a diagnostic and never poisons its
//! siblings, and an unparseable document loads as an empty collection.

use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::types::download::{DownloadRecord, DownloadStatus, MediaItem};
use crate::types::errors::StoreError;

/// Key of the current download snapshot in the flat-text store.
pub const DOWNLOADS_STORE_KEY: &str = "downloads-v2";

/// Version stamp written into every snapshot.
pub const STORE_SCHEMA_VERSION: u32 = 2;

/// On-wire shape of one download record.
///
/// Everything is optional or defaulted: the format has accumulated fields
/// over time and old snapshots miss some of them. Identity can come from
/// the full `item` descriptor or from the minimal `itemId`/`serverId`
/// pair; a record carrying neither is unreconstructable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<MediaItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    pub server_url: String,
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    pub download_url: String,
    /// Pre-status completion flag. Read for rehydration, never written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
    pub is_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_play: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl PersistedRecord {
    fn from_record(record: &DownloadRecord) -> Self {
        Self {
            item: Some(record.item.clone()),
            item_id: None,
            server_id: None,
            server_url: record.server_url.clone(),
            api_key: record.api_key.clone(),
            title: None,
            filename: record.filename.clone(),
            extension: record.extension.clone(),
            download_url: record.download_url.clone(),
            is_complete: None,
            is_new: record.is_new,
            can_play: Some(record.can_play),
            status: Some(record.status.as_str().to_string()),
        }
    }
}

#[derive(Serialize)]
struct PersistedStore {
    state: PersistedState,
    version: u32,
}

#[derive(Serialize)]
struct PersistedState {
    downloads: Vec<(String, PersistedRecord)>,
}

// Decode side goes through `serde_json::Value` per pair so one malformed
// entry cannot fail the whole document.
#[derive(Deserialize)]
struct RawStore {
    state: RawState,
}

#[derive(Deserialize)]
struct RawState {
    #[serde(default)]
    downloads: Vec<serde_json::Value>,
}

/// Flattens the registry snapshot into the persisted flat-text form.
///
/// # Errors
/// Returns `StoreError::Serialization` if encoding fails.
pub fn encode(records: &[DownloadRecord]) -> Result<String, StoreError> {
    let downloads = records
        .iter()
        .map(|r| (r.key.clone(), PersistedRecord::from_record(r)))
        .collect();
    let store = PersistedStore {
        state: PersistedState { downloads },
        version: STORE_SCHEMA_VERSION,
    };
    serde_json::to_string(&store).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Rebuilds the registry collection from persisted flat text.
///
/// Pair order is preserved. Invalid entries are skipped with a warning;
/// an unparseable document yields an empty collection.
pub fn decode(text: &str) -> Vec<DownloadRecord> {
    let raw: RawStore = match serde_json::from_str(text) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "download snapshot unparseable; starting empty");
            return Vec::new();
        }
    };

    let mut records: Vec<DownloadRecord> = Vec::new();
    for entry in raw.state.downloads {
        let (key, persisted): (String, PersistedRecord) = match serde_json::from_value(entry) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed download entry");
                continue;
            }
        };
        let Some(record) = rehydrate(&key, persisted) else {
            continue;
        };
        if records.iter().any(|r| r.key == record.key) {
            tracing::warn!(key = %record.key, "skipping duplicate download entry");
            continue;
        }
        records.push(record);
    }
    records
}

/// Per-entry validation and status rehydration.
///
/// Returns `None` (with a diagnostic) for entries missing both the full
/// item descriptor and the minimal `itemId`/`serverId` pair. Persisted
/// `Downloading` is downgraded to `Queued` — no transfer survives a
/// process restart and resuming is unsupported. A legacy
/// `isComplete: true` with no explicit status loads as `Complete`, and a
/// missing `canPlay` defaults to playable.
pub fn rehydrate(key: &str, raw: PersistedRecord) -> Option<DownloadRecord> {
    let item = match raw.item {
        Some(item) => item,
        None => {
            let (Some(id), Some(server_id)) = (raw.item_id, raw.server_id) else {
                tracing::warn!(key = %key, "skipping download entry with no item identity");
                return None;
            };
            MediaItem {
                id,
                server_id,
                name: raw.title.unwrap_or_default(),
            }
        }
    };

    let status = match raw.status.as_deref() {
        Some("Downloading") => DownloadStatus::Queued,
        Some(s) => DownloadStatus::from_persisted(s),
        None if raw.is_complete == Some(true) => DownloadStatus::Complete,
        None => DownloadStatus::Queued,
    };

    Some(DownloadRecord {
        key: key.to_string(),
        item,
        server_url: raw.server_url,
        api_key: raw.api_key,
        filename: raw.filename,
        extension: raw.extension,
        download_url: raw.download_url,
        status,
        is_new: raw.is_new,
        can_play: raw.can_play.unwrap_or(true),
    })
}

/// Loads the current snapshot from the store.
///
/// Absence of any prior snapshot yields an empty collection.
///
/// # Errors
/// Returns `StoreError::Database` only if the storage medium itself fails.
pub fn load(db: &Database) -> Result<Vec<DownloadRecord>, StoreError> {
    match db.get_item(DOWNLOADS_STORE_KEY)? {
        Some(text) => Ok(decode(&text)),
        None => Ok(Vec::new()),
    }
}
