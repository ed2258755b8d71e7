/// In-memory journal for tests and ephemeral kiosks.
pub mod memory;
/// SQLite-backed journal.
pub mod sqlite;

use thiserror::Error;

use crate::{op::StoredOp, types::OpSeq};

/// Failure while reading or writing the durable medium.
#[derive(Debug, Error)]
pub enum PersistError {
    /// SQLite reported an error.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A payload could not be encoded or decoded.
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
    /// Any other persistence failure.
    #[error("{0}")]
    Message(String),
}

/// Result alias for persistence calls.
pub type PersistResult<T> = Result<T, PersistError>;

/// Durable medium holding the full visit collection as one keyed blob.
pub trait VisitJournal: Send {
    /// Reads the current blob; `None` when nothing was ever written.
    fn load_blob(&self) -> PersistResult<Option<Vec<u8>>>;

    /// Replaces the blob and journals `op` as one atomic write.
    fn commit(&mut self, blob: &[u8], op: &StoredOp) -> PersistResult<()>;

    /// Highest journaled sequence, or zero.
    fn latest_seq(&self) -> PersistResult<OpSeq> {
        Ok(0)
    }

    /// Journaled operations in sequence order.
    fn history(&self) -> PersistResult<Vec<StoredOp>> {
        Ok(Vec::new())
    }
}
