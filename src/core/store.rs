use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    op::{Op, StoredOp},
    persist::{PersistError, PersistResult, VisitJournal, memory::MemoryJournal},
    types::{OpSeq, VisitId},
    visit::{CloseVisit, ValidationError, VisitRecord},
};

/// Version number for the serialized visit collection.
pub const SNAPSHOT_FORMAT_VERSION: u16 = 1;

/// Store-level failure; nothing is committed when one is returned.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record was rejected before writing.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No record has this id.
    #[error("visit `{0}` not found")]
    NotFound(VisitId),
    /// The record already has a check-out time.
    #[error("visit `{0}` is already closed")]
    AlreadyClosed(VisitId),
    /// The journal write failed.
    #[error("persist: {0}")]
    Persist(#[from] PersistError),
}

/// Durable blob could not be decoded; the store recovers by starting empty.
#[derive(Debug, Error)]
#[error("visit store blob is unreadable: {0}")]
pub(crate) struct StorageCorruptError(String);

/// Versioned envelope for the stored visit collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshotV1 {
    /// Envelope format, [`SNAPSHOT_FORMAT_VERSION`].
    pub format_version: u16,
    /// Sequence the next journaled op will take.
    pub next_seq: OpSeq,
    /// Visits in check-in order.
    pub visits: Vec<VisitRecord>,
}

/// Keyed collection of visits owned by one kiosk.
pub trait VisitRecordStore: Send {
    /// Every record in insertion order.
    fn records(&self) -> Vec<&VisitRecord>;

    /// Record by id, active or closed.
    fn get(&self, id: &VisitId) -> Option<VisitRecord>;

    /// Persists a new record; rejects an id that already exists.
    fn append(&mut self, record: VisitRecord) -> Result<VisitRecord, StoreError>;

    /// Applies the close transition to an active record.
    fn update(&mut self, id: &VisitId, close: CloseVisit) -> Result<VisitRecord, StoreError>;

    /// Owned copy of every record in insertion order.
    fn load_all(&self) -> Vec<VisitRecord> {
        self.records().into_iter().cloned().collect()
    }

    /// Records without a check-out time, in insertion order.
    fn active(&self) -> Vec<&VisitRecord> {
        self.records()
            .into_iter()
            .filter(|rec| rec.is_active())
            .collect()
    }
}

/// [`VisitRecordStore`] that rewrites the whole collection through a
/// [`VisitJournal`] on every mutation.
pub struct VisitStore {
    journal: Box<dyn VisitJournal>,
    records: HashMap<VisitId, VisitRecord>,
    order: Vec<VisitId>,
    next_seq: OpSeq,
}

impl VisitStore {
    /// Loads the collection held by `journal`.
    ///
    /// An unreadable blob is logged and treated as an empty store; the next
    /// mutation overwrites it.
    pub fn open(journal: impl VisitJournal + 'static) -> Self {
        let mut store = Self {
            journal: Box::new(journal),
            records: HashMap::new(),
            order: Vec::new(),
            next_seq: 1,
        };

        let snapshot = match store.journal.load_blob() {
            Ok(Some(bytes)) => match decode_snapshot(&bytes) {
                Ok(snapshot) => Some(snapshot),
                Err(err) => {
                    warn!(error = %err, "discarding unreadable visit store");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "visit store medium unreadable, starting empty");
                None
            }
        };

        if let Some(snapshot) = snapshot {
            store.restore(snapshot);
        }

        // The journal outlives a discarded blob; never reuse its sequences.
        match store.journal.latest_seq() {
            Ok(seq) => store.next_seq = store.next_seq.max(seq.saturating_add(1)),
            Err(err) => warn!(error = %err, "could not read journal sequence"),
        }
        store
    }

    /// Store over a fresh [`MemoryJournal`].
    pub fn in_memory() -> Self {
        Self::open(MemoryJournal::new())
    }

    /// Current collection in its stored envelope.
    pub fn export_snapshot(&self) -> StoreSnapshotV1 {
        let visits = self
            .order
            .iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect();

        StoreSnapshotV1 {
            format_version: SNAPSHOT_FORMAT_VERSION,
            next_seq: self.next_seq,
            visits,
        }
    }

    /// Journaled operations, oldest first.
    pub fn history(&self) -> PersistResult<Vec<StoredOp>> {
        self.journal.history()
    }

    /// Number of visits, active or closed.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when no visit was ever recorded.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Sequence of the last committed op, or zero.
    pub fn latest_op_seq(&self) -> OpSeq {
        self.next_seq.saturating_sub(1)
    }

    fn restore(&mut self, snapshot: StoreSnapshotV1) {
        for rec in snapshot.visits {
            if self.records.contains_key(&rec.id) {
                warn!(visit_id = %rec.id, "skipping duplicate visit id in stored collection");
                continue;
            }
            self.order.push(rec.id.clone());
            self.records.insert(rec.id.clone(), rec);
        }
        self.next_seq = snapshot.next_seq.max(1);
    }

    fn commit(&mut self, snapshot: &StoreSnapshotV1, stored: &StoredOp) -> Result<(), StoreError> {
        let blob = serde_json::to_vec(snapshot).map_err(PersistError::from)?;
        self.journal.commit(&blob, stored)?;
        self.next_seq = stored.seq.saturating_add(1);
        Ok(())
    }
}

impl VisitRecordStore for VisitStore {
    fn records(&self) -> Vec<&VisitRecord> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    fn get(&self, id: &VisitId) -> Option<VisitRecord> {
        self.records.get(id).cloned()
    }

    fn append(&mut self, record: VisitRecord) -> Result<VisitRecord, StoreError> {
        if self.records.contains_key(&record.id) {
            return Err(ValidationError::DuplicateId(record.id).into());
        }

        let seq = self.next_seq;
        let mut snapshot = self.export_snapshot();
        snapshot.visits.push(record.clone());
        snapshot.next_seq = seq.saturating_add(1);

        let stored = StoredOp {
            seq,
            ts: record.check_in_time,
            op: Op::CheckIn {
                visit: record.clone(),
            },
        };
        self.commit(&snapshot, &stored)?;

        self.order.push(record.id.clone());
        self.records.insert(record.id.clone(), record.clone());
        info!(visit_id = %record.id, seq, "visit appended");
        Ok(record)
    }

    fn update(&mut self, id: &VisitId, close: CloseVisit) -> Result<VisitRecord, StoreError> {
        let current = self
            .records
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if !current.is_active() {
            return Err(StoreError::AlreadyClosed(id.clone()));
        }

        let mut closed = current.clone();
        close.apply_to(&mut closed);
        let at = closed.check_out_time.unwrap_or(close.at);

        let seq = self.next_seq;
        let mut snapshot = self.export_snapshot();
        snapshot.next_seq = seq.saturating_add(1);
        if let Some(slot) = snapshot.visits.iter_mut().find(|rec| &rec.id == id) {
            *slot = closed.clone();
        }

        let stored = StoredOp {
            seq,
            ts: at,
            op: Op::CheckOut { id: id.clone(), at },
        };
        self.commit(&snapshot, &stored)?;

        self.records.insert(id.clone(), closed.clone());
        info!(visit_id = %id, seq, "visit closed");
        Ok(closed)
    }
}

fn decode_snapshot(payload: &[u8]) -> Result<StoreSnapshotV1, StorageCorruptError> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(StoreSnapshotV1 {
            format_version: SNAPSHOT_FORMAT_VERSION,
            next_seq: 1,
            visits: Vec::new(),
        });
    }

    if let Ok(snapshot) = serde_json::from_slice::<StoreSnapshotV1>(payload) {
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(StorageCorruptError(format!(
                "unsupported snapshot format version: {}",
                snapshot.format_version
            )));
        }
        return Ok(snapshot);
    }

    // Older kiosks stored the bare record array without an envelope.
    serde_json::from_slice::<Vec<VisitRecord>>(payload)
        .map(|visits| StoreSnapshotV1 {
            format_version: SNAPSHOT_FORMAT_VERSION,
            next_seq: 1,
            visits,
        })
        .map_err(|e| StorageCorruptError(e.to_string()))
}
