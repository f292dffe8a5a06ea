//! SQLite-backed append-only contact journal.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::types::ContactSeq;

use super::{
    CONTACT_FORMAT_VERSION, ContactSink, PersistResult, StoredContact,
    StoredContactEnvelope,
};

/// SQLite implementation of [`ContactSink`].
pub struct SqliteContactSink {
    conn: Connection,
}

impl SqliteContactSink {
    /// Opens or creates a SQLite-backed sink at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite sink.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    /// Loads every journaled contact in sequence order.
    pub fn load_contacts(&self) -> PersistResult<Vec<StoredContact>> {
        self.load_contacts_after(0)
    }

    /// Loads contacts strictly after `seq`.
    pub fn load_contacts_after(&self, seq: ContactSeq) -> PersistResult<Vec<StoredContact>> {
        let mut stmt = self
            .conn
            .prepare("SELECT seq, payload FROM contacts WHERE seq > ?1 ORDER BY seq ASC")?;

        let rows = stmt.query_map(params![seq as i64], |row| {
            let seq: i64 = row.get(0)?;
            let payload: Vec<u8> = row.get(1)?;
            let mut stored = decode_payload(&payload).map_err(|err| {
                rusqlite::Error::FromSqlConversionFailure(
                    payload.len(),
                    rusqlite::types::Type::Blob,
                    Box::new(std::io::Error::other(err)),
                )
            })?;
            stored.seq = seq as ContactSeq;
            Ok(stored)
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Number of journaled contacts with `peer_call`.
    pub fn count_for_call(&self, peer_call: &str) -> PersistResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM contacts WHERE peer_call = ?1",
            params![peer_call.to_ascii_uppercase()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Returns the latest sequence persisted.
    pub fn latest_seq(&self) -> PersistResult<ContactSeq> {
        let seq: Option<i64> = self
            .conn
            .query_row("SELECT MAX(seq) FROM contacts", [], |row| row.get(0))
            .optional()?
            .flatten();
        Ok(seq.unwrap_or(0) as ContactSeq)
    }
}

impl ContactSink for SqliteContactSink {
    fn append_contacts(&mut self, contacts: &[StoredContact]) -> PersistResult<ContactSeq> {
        if contacts.is_empty() {
            return self.latest_seq();
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO contacts(seq, ts_ms, peer_call, band, payload) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for stored in contacts {
                let payload = serde_json::to_vec(&StoredContactEnvelope::new(stored.clone()))?;
                stmt.execute(params![
                    stored.seq as i64,
                    stored.contact.ts_ms as i64,
                    stored.contact.peer_call.to_ascii_uppercase(),
                    stored.contact.band.label(),
                    payload,
                ])?;
            }
        }
        tx.commit()?;

        Ok(contacts.last().map(|c| c.seq).unwrap_or(0))
    }

    fn flush(&mut self) -> PersistResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(PASSIVE);")?;
        Ok(())
    }
}

fn decode_payload(payload: &[u8]) -> Result<StoredContact, String> {
    let envelope = serde_json::from_slice::<StoredContactEnvelope>(payload)
        .map_err(|e| format!("contact payload decode failed: {e}"))?;
    if envelope.format_version != CONTACT_FORMAT_VERSION {
        return Err(format!(
            "unsupported contact format version: {}",
            envelope.format_version
        ));
    }
    Ok(envelope.stored)
}

