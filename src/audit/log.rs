//! Bounded audit log persisted through `Storage`.
//!
//! The log is a JSON array of entries, oldest first, capped at a fixed number
//! of entries. Appending past the cap evicts from the front, so the log
//! always holds the most recent entries in their original order.
//!
//! An unreadable log is never silently lost: the first append after it is
//! found copies the raw value to `AUDIT_LOG_BACKUP_KEY` before starting over.
//!
//! Each append is a read-modify-write of the whole array. That is serialized
//! within one process by an internal lock, but two processes sharing a
//! storage backend can still lose an entry to a concurrent write.

use crate::audit::types::AuditEntry;
use crate::error::StorageError;
use crate::policy::defaults::{AUDIT_LOG_BACKUP_KEY, AUDIT_LOG_CAPACITY, AUDIT_LOG_KEY};
use crate::storage::{self, Storage};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

pub struct AuditLog {
    storage: Arc<dyn Storage>,
    capacity: usize,
    write_lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_capacity(storage, AUDIT_LOG_CAPACITY)
    }

    pub fn with_capacity(storage: Arc<dyn Storage>, capacity: usize) -> Self {
        Self {
            storage,
            capacity,
            write_lock: Mutex::new(()),
        }
    }

    /// Append an entry, evicting the oldest ones beyond capacity.
    pub fn append(&self, entry: AuditEntry) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();

        let mut entries: VecDeque<AuditEntry> = match self.read()? {
            Stored::Entries(entries) => entries.into(),
            Stored::Unreadable(raw) => {
                self.storage.set(AUDIT_LOG_BACKUP_KEY, &raw)?;
                tracing::warn!(
                    "Unreadable audit log moved to '{}' before starting over",
                    AUDIT_LOG_BACKUP_KEY
                );
                VecDeque::new()
            }
        };
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }

        storage::store_json(self.storage.as_ref(), AUDIT_LOG_KEY, &entries)?;
        tracing::debug!("Audit log now holds {} entries", entries.len());
        Ok(())
    }

    /// All stored entries, oldest first. A corrupt log reads as empty (and is
    /// backed up, then replaced, on the next append).
    pub fn entries(&self) -> Result<Vec<AuditEntry>, StorageError> {
        match self.read()? {
            Stored::Entries(entries) => Ok(entries),
            Stored::Unreadable(_) => Ok(Vec::new()),
        }
    }

    fn read(&self) -> Result<Stored, StorageError> {
        let Some(text) = self.storage.get(AUDIT_LOG_KEY)? else {
            return Ok(Stored::Entries(Vec::new()));
        };
        match serde_json::from_str(&text) {
            Ok(entries) => Ok(Stored::Entries(entries)),
            Err(e) => {
                tracing::warn!("Stored audit log is unreadable: {}", e);
                Ok(Stored::Unreadable(text))
            }
        }
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        self.storage.remove(AUDIT_LOG_KEY)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

enum Stored {
    Entries(Vec<AuditEntry>),
    Unreadable(String),
}
