//! Best-effort collaborators: remote system of record, host directory, and
//! host notification.
//!
//! Every call returns a [`RemoteFailure`] value instead of panicking or
//! propagating transport errors; the lifecycle manager downgrades these to
//! warnings.

/// Static directory and log-backed notifier.
pub mod directory;
/// REST implementation of [`RemoteVisitSink`].
pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{types::VisitId, visit::VisitRecord};

/// Failure reported by a remote collaborator. Always advisory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteFailure {
    /// The remote could not be reached.
    #[error("remote unreachable: {0}")]
    Unreachable(String),
    /// The remote answered with a non-success status.
    #[error("remote rejected request with status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },
    /// The remote has no row for this visit.
    #[error("remote has no row for visit `{0}`")]
    MissingRow(VisitId),
    /// The remote returned an id already used by a local visit.
    #[error("remote id `{0}` is already used by a local visit")]
    Conflict(VisitId),
    /// The response did not have the expected shape.
    #[error("remote response could not be decoded: {0}")]
    Decode(String),
}

/// External system of record mirrored on check-in and check-out.
#[async_trait]
pub trait RemoteVisitSink: Send + Sync {
    /// Creates the remote row and returns its identifier.
    ///
    /// `record.id` is a provisional local id the sink may ignore.
    async fn record_check_in(&self, record: &VisitRecord) -> Result<VisitId, RemoteFailure>;

    /// Stamps the check-out instant on the remote row.
    async fn record_check_out(&self, id: &VisitId, at: DateTime<Utc>) -> Result<(), RemoteFailure>;
}

/// Person who can be told a visitor has arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostContact {
    /// Identifier understood by the notifier, e.g. a chat user id.
    pub id: String,
    /// Short handle such as `jane.smith`.
    pub handle: String,
    /// Full display name such as `Jane Smith`.
    pub display_name: String,
}

impl HostContact {
    /// True when `person` names this host by display name or handle,
    /// ignoring case and surrounding whitespace.
    pub fn is_named(&self, person: &str) -> bool {
        let wanted = person.trim().to_lowercase();
        self.display_name.to_lowercase() == wanted || self.handle.to_lowercase() == wanted
    }
}

/// Lookup of hosts that can be notified.
#[async_trait]
pub trait VisitorDirectory: Send + Sync {
    /// Every known host.
    async fn list_hosts(&self) -> Result<Vec<HostContact>, RemoteFailure>;

    /// Host matching the free-text person-to-meet field, if any.
    async fn resolve(&self, person_to_meet: &str) -> Result<Option<HostContact>, RemoteFailure> {
        Ok(self
            .list_hosts()
            .await?
            .into_iter()
            .find(|host| host.is_named(person_to_meet)))
    }
}

/// Capability to tell a host their visitor is at reception.
#[async_trait]
pub trait HostNotifier: Send + Sync {
    /// Sends one notification.
    async fn notify(
        &self,
        host: &HostContact,
        visitor_name: &str,
        purpose: &str,
    ) -> Result<(), RemoteFailure>;
}
