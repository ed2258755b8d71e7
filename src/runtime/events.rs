//! Runtime event stream payloads.

use crate::{lifecycle::RemoteStage, types::VisitId};

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitEvent {
    /// A visitor checked in.
    CheckedIn {
        /// New visit id.
        id: VisitId,
    },
    /// A visitor checked out.
    CheckedOut {
        /// Closed visit id.
        id: VisitId,
    },
    /// A best-effort remote step failed but the local commit went through.
    RemoteDegraded {
        /// Visit the failure relates to.
        id: VisitId,
        /// Step that failed.
        stage: RemoteStage,
    },
}
