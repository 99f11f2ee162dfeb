use std::fmt;

// === StoreError ===

/// Errors surfaced by the durable storage layer.
///
/// Registry mutations themselves are infallible (duplicates and missing
/// keys are boolean signals, never errors); only the storage medium can
/// fail, and it does so at `open` or at a `flush` barrier.
#[derive(Debug)]
pub enum StoreError {
    /// The underlying database operation failed.
    Database(String),
    /// Failed to serialize or deserialize a persisted snapshot.
    Serialization(String),
    /// The background writer has shut down and can no longer accept work.
    WriterClosed,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(msg) => write!(f, "Store database error: {}", msg),
            StoreError::Serialization(msg) => {
                write!(f, "Store serialization error: {}", msg)
            }
            StoreError::WriterClosed => write!(f, "Store writer has shut down"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}
