//! Process-local journal; clones share the same backing state.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::{op::StoredOp, types::OpSeq};

use super::{PersistError, PersistResult, VisitJournal};

#[derive(Debug, Default)]
struct Inner {
    blob: Option<Vec<u8>>,
    ops: Vec<StoredOp>,
    fail_commits: bool,
}

/// [`VisitJournal`] kept in memory.
///
/// Cloning yields a second handle onto the same blob, which lets tests drop a
/// store and reopen it as if the process had restarted.
#[derive(Debug, Clone, Default)]
pub struct MemoryJournal {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryJournal {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a journal whose blob already holds `bytes`.
    pub fn with_blob(bytes: impl Into<Vec<u8>>) -> Self {
        let journal = Self::default();
        if let Ok(mut inner) = journal.inner.lock() {
            inner.blob = Some(bytes.into());
        }
        journal
    }

    /// Makes every following commit fail until reset.
    pub fn set_failing(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_commits = fail;
        }
    }

    fn lock(&self) -> PersistResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| PersistError::Message("memory journal lock poisoned".to_string()))
    }
}

impl VisitJournal for MemoryJournal {
    fn load_blob(&self) -> PersistResult<Option<Vec<u8>>> {
        Ok(self.lock()?.blob.clone())
    }

    fn commit(&mut self, blob: &[u8], op: &StoredOp) -> PersistResult<()> {
        let mut inner = self.lock()?;
        if inner.fail_commits {
            return Err(PersistError::Message("memory journal write rejected".to_string()));
        }
        inner.blob = Some(blob.to_vec());
        inner.ops.push(op.clone());
        Ok(())
    }

    fn latest_seq(&self) -> PersistResult<OpSeq> {
        Ok(self.lock()?.ops.last().map(|op| op.seq).unwrap_or(0))
    }

    fn history(&self) -> PersistResult<Vec<StoredOp>> {
        Ok(self.lock()?.ops.clone())
    }
}
