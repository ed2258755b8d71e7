//! Mutation operation model and persistence wrappers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    types::{OpSeq, VisitId},
    visit::VisitRecord,
};

/// Version number for serialized [`StoredOpEnvelope`] payloads.
pub const OP_FORMAT_VERSION: u16 = 1;

/// Immutable operation appended to the audit journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    /// A new active visit was recorded.
    CheckIn {
        /// Inserted record.
        visit: VisitRecord,
    },
    /// An active visit was closed.
    CheckOut {
        /// Visit id that was closed.
        id: VisitId,
        /// Stored check-out instant.
        at: DateTime<Utc>,
    },
}

impl Op {
    /// Numeric kind used by the journal table.
    pub fn kind(&self) -> i64 {
        match self {
            Op::CheckIn { .. } => 1,
            Op::CheckOut { .. } => 2,
        }
    }

    /// Visit the operation refers to.
    pub fn visit_id(&self) -> &VisitId {
        match self {
            Op::CheckIn { visit } => &visit.id,
            Op::CheckOut { id, .. } => id,
        }
    }
}

/// Journal row metadata plus operation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOp {
    /// Monotonic operation sequence.
    pub seq: OpSeq,
    /// Instant the operation was committed.
    pub ts: DateTime<Utc>,
    /// Operation body.
    pub op: Op,
}

/// Versioned wrapper for stable on-disk payload decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOpEnvelope {
    /// Payload format version.
    pub format_version: u16,
    /// Wrapped operation.
    pub stored: StoredOp,
}

impl StoredOpEnvelope {
    /// Constructs an envelope using [`OP_FORMAT_VERSION`].
    pub fn new(stored: StoredOp) -> Self {
        Self {
            format_version: OP_FORMAT_VERSION,
            stored,
        }
    }
}
