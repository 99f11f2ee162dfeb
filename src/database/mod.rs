//! Durable storage layer for the download registry.
//!
//! Provides SQLite connection management, schema migrations, and the
//! background writer that serializes snapshot flushes.
//!
//! # Usage
//!
//! ```no_run
//! use mediastash::database::Database;
//!
//! // Open a persistent store
//! let db = Database::open("mediastash.db").expect("failed to open database");
//!
//! // Or use an in-memory store for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//!
//! // Flat-text item access
//! db.set_item("example-store", "{}").unwrap();
//! assert_eq!(db.get_item("example-store").unwrap().as_deref(), Some("{}"));
//! ```

pub mod connection;
pub mod migrations;
pub mod writer;

pub use connection::Database;
pub use writer::StoreWriter;
