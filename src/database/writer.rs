//! Background writer serializing durable flushes.
//!
//! Registry mutations commit to memory synchronously and enqueue a full
//! snapshot here; a single consumer thread applies writes in enqueue
//! order, so a later mutation's flush can never be overtaken by an
//! earlier one. Durability is eventual — callers that need confirmation
//! use [`StoreWriter::flush`], which is also where storage-medium
//! failures surface.

use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use crate::database::Database;
use crate::types::errors::StoreError;

enum WriteCommand {
    Put { key: String, value: String },
    Barrier(Sender<Option<StoreError>>),
}

/// Owns the writer thread and the channel feeding it.
///
/// Dropping the writer closes the channel; the thread drains any pending
/// writes and exits, and the drop blocks until it has.
pub struct StoreWriter {
    tx: Option<Sender<WriteCommand>>,
    handle: Option<JoinHandle<()>>,
}

impl StoreWriter {
    /// Takes ownership of the database and starts the writer thread.
    pub fn spawn(db: Database) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let mut last_error: Option<StoreError> = None;
            for cmd in rx {
                match cmd {
                    WriteCommand::Put { key, value } => {
                        if let Err(e) = db.set_item(&key, &value) {
                            tracing::error!(key = %key, error = %e, "snapshot flush failed");
                            last_error = Some(StoreError::from(e));
                        }
                    }
                    WriteCommand::Barrier(reply) => {
                        let _ = reply.send(last_error.take());
                    }
                }
            }
        });
        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    /// Enqueues a flat-text write. Returns immediately; the write lands
    /// in enqueue order.
    pub fn put(&self, key: &str, value: String) {
        let Some(tx) = &self.tx else { return };
        let command = WriteCommand::Put {
            key: key.to_string(),
            value,
        };
        if tx.send(command).is_err() {
            tracing::error!(key = %key, "store writer has shut down; snapshot dropped");
        }
    }

    /// Blocks until every previously enqueued write has been applied.
    ///
    /// # Errors
    /// Returns the most recent write failure since the last barrier, or
    /// `StoreError::WriterClosed` if the writer thread is gone.
    pub fn flush(&self) -> Result<(), StoreError> {
        let tx = self.tx.as_ref().ok_or(StoreError::WriterClosed)?;
        let (reply_tx, reply_rx) = mpsc::channel();
        tx.send(WriteCommand::Barrier(reply_tx))
            .map_err(|_| StoreError::WriterClosed)?;
        match reply_rx.recv() {
            Ok(None) => Ok(()),
            Ok(Some(e)) => Err(e),
            Err(_) => Err(StoreError::WriterClosed),
        }
    }
}

impl Drop for StoreWriter {
    fn drop(&mut self) {
        // Closing the channel lets the thread drain pending writes and exit.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
