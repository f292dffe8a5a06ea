//! Completed-contact records: the in-memory worked list and the seam to the
//! persistent log writer.

/// SQLite contact journal.
pub mod sqlite;
/// Fixed-capacity worked list with paged read-out.
pub mod worked;

use serde::{Deserialize, Serialize};

use crate::types::{Band, ContactSeq, Report};

/// Version number for serialized [`StoredContactEnvelope`] payloads.
pub const CONTACT_FORMAT_VERSION: u16 = 1;

/// One completed contact, as handed to the persistent log writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Own callsign at the time of the contact.
    pub own_call: String,
    /// Own locator.
    pub own_grid: String,
    /// Peer callsign.
    pub peer_call: String,
    /// Peer locator, empty when none was exchanged.
    pub peer_grid: String,
    /// Band of operation.
    pub band: Band,
    /// Report we sent.
    pub sent_report: Report,
    /// Report we received.
    pub received_report: Report,
    /// Completion time in milliseconds since epoch.
    pub ts_ms: u64,
}

/// Journal row: sequence number plus contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredContact {
    /// Monotonic journal sequence.
    pub seq: ContactSeq,
    /// Contact body.
    pub contact: ContactRecord,
}

/// Versioned wrapper for stable on-disk payload decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredContactEnvelope {
    /// Payload format version.
    pub format_version: u16,
    /// Wrapped contact.
    pub stored: StoredContact,
}

impl StoredContactEnvelope {
    /// Constructs an envelope using [`CONTACT_FORMAT_VERSION`].
    pub fn new(stored: StoredContact) -> Self {
        Self {
            format_version: CONTACT_FORMAT_VERSION,
            stored,
        }
    }
}

/// Failure reported by a [`ContactSink`].
#[derive(Debug)]
pub enum PersistError {
    /// SQLite reported an error.
    Sqlite(rusqlite::Error),
    /// Payload could not be encoded or decoded.
    Serde(serde_json::Error),
    /// Anything else, described.
    Message(String),
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Result of a persistence call.
pub type PersistResult<T> = Result<T, PersistError>;

/// Persistent log writer. Receives each completed contact exactly once.
pub trait ContactSink: Send {
    /// Stores `contacts` in order and returns the highest sequence stored.
    fn append_contacts(&mut self, contacts: &[StoredContact]) -> PersistResult<ContactSeq>;
    /// Makes everything appended so far durable.
    fn flush(&mut self) -> PersistResult<()> {
        Ok(())
    }
}

/// Sink that keeps contacts in memory; handy for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryContactSink {
    contacts: std::sync::Arc<std::sync::Mutex<Vec<StoredContact>>>,
}

impl MemoryContactSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of everything appended so far.
    pub fn contacts(&self) -> std::sync::Arc<std::sync::Mutex<Vec<StoredContact>>> {
        std::sync::Arc::clone(&self.contacts)
    }
}

impl ContactSink for MemoryContactSink {
    fn append_contacts(&mut self, contacts: &[StoredContact]) -> PersistResult<ContactSeq> {
        let mut all = self
            .contacts
            .lock()
            .map_err(|_| PersistError::Message("memory sink poisoned".to_string()))?;
        all.extend_from_slice(contacts);
        Ok(all.last().map(|c| c.seq).unwrap_or(0))
    }
}
