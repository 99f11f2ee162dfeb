//! Download registry for media server clients.
//!
//! The authoritative in-memory collection of download records, backed by
//! the flat-text store. Mutations commit to memory synchronously, enqueue
//! a snapshot on the background writer, then notify observers — so
//! visibility is immediate and durability is eventual.

use crate::database::{Database, StoreWriter};
use crate::services::{legacy_migration, registry_codec};
use crate::types::download::DownloadRecord;
use crate::types::errors::StoreError;

/// Change notification emitted after each committed mutation, carrying
/// the affected record key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Added(String),
    Updated(String),
    Removed(String),
    Cleared,
}

/// Registered change observer. Invoked post-commit, never mid-mutation.
pub type Observer = Box<dyn Fn(&RegistryEvent) + Send>;

/// Trait defining the registry's consumer-facing surface.
pub trait DownloadRegistryTrait {
    /// Inserts the record if its key is absent. Returns whether an
    /// insertion occurred; an existing key is a no-op, never an
    /// overwrite and never an error.
    fn add(&mut self, record: DownloadRecord) -> bool;
    /// Unconditional upsert keyed by `record.key`; last write wins.
    fn update(&mut self, record: DownloadRecord);
    /// Removes the record if present. A missing key is a `false`
    /// result, not an error.
    fn delete(&mut self, key: &str) -> bool;
    /// Clears the entire collection (sign-out / clear-data flows).
    fn reset(&mut self);
    /// Read-only aggregate over the current records.
    fn count(&self, predicate: &dyn Fn(&DownloadRecord) -> bool) -> usize;
    fn get(&self, key: &str) -> Option<&DownloadRecord>;
    fn list(&self) -> Vec<&DownloadRecord>;
}

/// Download registry backed by the flat-text store, with an in-memory
/// record cache and observer fan-out.
pub struct DownloadRegistry {
    records: Vec<DownloadRecord>,
    writer: StoreWriter,
    observers: Vec<Observer>,
}

impl DownloadRegistry {
    /// Opens the registry against a store.
    ///
    /// Rehydrates the persisted snapshot, runs the legacy migration gate
    /// to completion (a blocking startup step — no observer can attach
    /// or query before it finishes), persists the merged state when the
    /// migration applied, then hands the database to the background
    /// writer and becomes ready.
    ///
    /// # Errors
    /// Returns `StoreError` if the storage medium fails during load or
    /// migration. Corrupt snapshot contents are not errors; they load as
    /// an empty collection.
    pub fn open(db: Database) -> Result<Self, StoreError> {
        let mut records = registry_codec::load(&db)?;

        let report = legacy_migration::run(&db)?;
        for record in report.converted {
            // Same uniqueness rule as add(): a partial prior migration
            // attempt never duplicates a record already present.
            if records.iter().all(|r| r.key != record.key) {
                records.push(record);
            }
        }
        if report.applied {
            let snapshot = registry_codec::encode(&records)?;
            db.set_item(registry_codec::DOWNLOADS_STORE_KEY, &snapshot)?;
        }

        Ok(Self {
            records,
            writer: StoreWriter::spawn(db),
            observers: Vec::new(),
        })
    }

    /// Registers a change observer, invoked after every committed
    /// mutation.
    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    /// Number of records the user has not acknowledged yet (UI badge).
    pub fn new_count(&self) -> usize {
        self.count(&|r| r.is_new)
    }

    /// Blocks until every enqueued snapshot write has landed.
    ///
    /// # Errors
    /// Surfaces the most recent storage-medium failure, if any.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.writer.flush()
    }

    fn find_index(&self, key: &str) -> Option<usize> {
        self.records.iter().position(|r| r.key == key)
    }

    /// In-memory state is already committed when this runs: enqueue the
    /// snapshot, then fan out to observers.
    fn commit(&self, event: RegistryEvent) {
        match registry_codec::encode(&self.records) {
            Ok(snapshot) => self
                .writer
                .put(registry_codec::DOWNLOADS_STORE_KEY, snapshot),
            Err(e) => tracing::error!(error = %e, "snapshot encode failed; write skipped"),
        }
        for observer in &self.observers {
            observer(&event);
        }
    }
}

impl DownloadRegistryTrait for DownloadRegistry {
    fn add(&mut self, record: DownloadRecord) -> bool {
        if self.find_index(&record.key).is_some() {
            tracing::debug!(key = %record.key, "add ignored: key already registered");
            return false;
        }
        let key = record.key.clone();
        self.records.push(record);
        self.commit(RegistryEvent::Added(key));
        true
    }

    fn update(&mut self, record: DownloadRecord) {
        let key = record.key.clone();
        match self.find_index(&key) {
            Some(idx) => self.records[idx] = record,
            None => self.records.push(record),
        }
        self.commit(RegistryEvent::Updated(key));
    }

    fn delete(&mut self, key: &str) -> bool {
        let Some(idx) = self.find_index(key) else {
            return false;
        };
        self.records.remove(idx);
        self.commit(RegistryEvent::Removed(key.to_string()));
        true
    }

    fn reset(&mut self) {
        self.records.clear();
        self.commit(RegistryEvent::Cleared);
    }

    fn count(&self, predicate: &dyn Fn(&DownloadRecord) -> bool) -> usize {
        self.records.iter().filter(|r| predicate(r)).count()
    }

    fn get(&self, key: &str) -> Option<&DownloadRecord> {
        self.records.iter().find(|r| r.key == key)
    }

    fn list(&self) -> Vec<&DownloadRecord> {
        self.records.iter().collect()
    }
}
