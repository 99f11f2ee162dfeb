use serde::{Deserialize, Serialize};

/// Status of a tracked media download.
///
/// Lifecycle: `Queued` → `Downloading` → `Complete` or `Failed`.
/// A failed download is retried by updating the record back to `Queued`,
/// not by creating a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadStatus {
    Queued,
    Downloading,
    Complete,
    Failed,
}

impl DownloadStatus {
    /// Canonical string form used in the persisted snapshot.
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::Queued => "Queued",
            DownloadStatus::Downloading => "Downloading",
            DownloadStatus::Complete => "Complete",
            DownloadStatus::Failed => "Failed",
        }
    }

    /// Lenient parse of a persisted status string.
    ///
    /// Unknown values fall back to `Queued` rather than failing the
    /// containing record.
    pub fn from_persisted(s: &str) -> DownloadStatus {
        match s {
            "Queued" => DownloadStatus::Queued,
            "Downloading" => DownloadStatus::Downloading,
            "Complete" => DownloadStatus::Complete,
            "Failed" => DownloadStatus::Failed,
            _ => DownloadStatus::Queued,
        }
    }
}

/// Minimal descriptor of a remote media item.
///
/// Opaque to the registry beyond being stored and returned; collaborators
/// supply it when requesting a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub server_id: String,
    /// Display name. May be empty for items reconstructed from partial
    /// persisted data; never fetched over the network during load.
    #[serde(default)]
    pub name: String,
}

/// Derives the stable registry key for a download.
///
/// Deduplication is scoped to server + item identity: the same item on
/// two different servers yields two distinct keys.
pub fn download_key(server_id: &str, item_id: &str) -> String {
    format!("{}-{}", server_id, item_id)
}

/// One tracked download's metadata and status.
///
/// The registry owns all records; `key` is immutable after creation and
/// unique within the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRecord {
    pub key: String,
    pub item: MediaItem,
    pub server_url: String,
    pub api_key: String,
    pub filename: String,
    pub extension: Option<String>,
    pub download_url: String,
    pub status: DownloadStatus,
    /// True until the user has viewed the completed download. Toggled by
    /// a consuming collaborator via `update`, not by status transitions.
    pub is_new: bool,
    /// Whether the local content is currently playable. Records persisted
    /// before this flag existed default to true on load.
    pub can_play: bool,
}

impl DownloadRecord {
    /// Creates a freshly requested download in its initial state.
    ///
    /// The key is derived from the item's server and id.
    pub fn new(
        item: MediaItem,
        server_url: impl Into<String>,
        api_key: impl Into<String>,
        filename: impl Into<String>,
        extension: Option<String>,
        download_url: impl Into<String>,
    ) -> Self {
        let key = download_key(&item.server_id, &item.id);
        Self {
            key,
            item,
            server_url: server_url.into(),
            api_key: api_key.into(),
            filename: filename.into(),
            extension,
            download_url: download_url.into(),
            status: DownloadStatus::Queued,
            is_new: true,
            can_play: true,
        }
    }
}
