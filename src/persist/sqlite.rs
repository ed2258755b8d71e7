//! SQLite-backed blob store with an append-only audit journal.

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::{
    op::{OP_FORMAT_VERSION, StoredOp, StoredOpEnvelope},
    types::{OpSeq, VisitId},
};

use super::{PersistError, PersistResult, VisitJournal};

/// Key of the row holding the serialized visit collection.
pub const VISITS_KEY: &str = "visitlog_visitors";

/// SQLite implementation of [`crate::persist::VisitJournal`].
pub struct SqliteJournal {
    conn: Connection,
}

impl SqliteJournal {
    /// Opens or creates a SQLite-backed journal at `path`.
    ///
    /// Enables WAL mode with `synchronous=FULL` so a returned commit survives
    /// power loss.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite journal.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        Ok(Self { conn })
    }

    /// Loads journaled operations strictly after `seq`.
    pub fn load_events_after(&self, seq: OpSeq) -> PersistResult<Vec<StoredOp>> {
        let mut stmt = self
            .conn
            .prepare("SELECT seq, payload FROM events WHERE seq > ?1 ORDER BY seq ASC")?;

        let rows = stmt.query_map(params![seq as i64], |row| {
            let seq: i64 = row.get(0)?;
            let payload: Vec<u8> = row.get(1)?;
            let mut op = decode_stored_op_payload(&payload).map_err(|err| {
                rusqlite::Error::FromSqlConversionFailure(
                    payload.len(),
                    rusqlite::types::Type::Blob,
                    Box::new(std::io::Error::other(err)),
                )
            })?;
            op.seq = seq as OpSeq;
            Ok(op)
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Journaled operations touching one visit, oldest first.
    pub fn events_for(&self, id: &VisitId) -> PersistResult<Vec<StoredOp>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM events WHERE visit_id = ?1 ORDER BY seq ASC")?;
        let rows = stmt.query_map(params![id.as_str()], |row| row.get::<_, Vec<u8>>(0))?;

        let mut out = Vec::new();
        for payload in rows {
            let payload = payload?;
            out.push(decode_stored_op_payload(&payload).map_err(PersistError::Message)?);
        }
        Ok(out)
    }

    /// Returns the latest sequence persisted in the events table.
    pub fn latest_seq(&self) -> PersistResult<OpSeq> {
        let seq: Option<i64> = self
            .conn
            .query_row("SELECT MAX(seq) FROM events", [], |row| row.get(0))
            .optional()?
            .flatten();
        Ok(seq.unwrap_or(0) as OpSeq)
    }
}

impl VisitJournal for SqliteJournal {
    fn load_blob(&self) -> PersistResult<Option<Vec<u8>>> {
        let payload: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT payload FROM kv WHERE key = ?1",
                params![VISITS_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn commit(&mut self, blob: &[u8], stored: &StoredOp) -> PersistResult<()> {
        let payload = serde_json::to_vec(&StoredOpEnvelope::new(stored.clone()))?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO kv(key, payload, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at",
            params![VISITS_KEY, blob, Utc::now().to_rfc3339()],
        )?;
        tx.execute(
            "INSERT INTO events(seq, ts, kind, visit_id, payload) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                stored.seq as i64,
                stored.ts.to_rfc3339(),
                stored.op.kind(),
                stored.op.visit_id().as_str(),
                payload,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn latest_seq(&self) -> PersistResult<OpSeq> {
        SqliteJournal::latest_seq(self)
    }

    fn history(&self) -> PersistResult<Vec<StoredOp>> {
        self.load_events_after(0)
    }
}

fn decode_stored_op_payload(payload: &[u8]) -> Result<StoredOp, String> {
    let envelope = serde_json::from_slice::<StoredOpEnvelope>(payload)
        .map_err(|e| format!("op payload decode failed: {e}"))?;
    if envelope.format_version != OP_FORMAT_VERSION {
        return Err(format!(
            "unsupported op format version: {}",
            envelope.format_version
        ));
    }
    Ok(envelope.stored)
}
