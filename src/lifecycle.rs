//! Check-in, check-out search, and check-out commit over an injected store.

use std::sync::Arc;

use chrono::{Local, TimeZone};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    clock::{Clock, SystemClock},
    core::{
        derived::display_purpose,
        search::{EmptySearchTerm, SearchTerm, first_active_match},
        store::{StoreError, VisitRecordStore},
    },
    persist::PersistError,
    remote::{HostNotifier, RemoteFailure, RemoteVisitSink, VisitorDirectory},
    types::VisitId,
    visit::{CloseVisit, ValidationError, VisitDraft, VisitRecord},
};

/// Outcome reported to the kiosk for a rejected operation.
#[derive(Debug, Error)]
pub enum VisitError {
    /// Check-in input was incomplete or malformed.
    #[error("invalid check-in: {0}")]
    Validation(#[from] ValidationError),
    /// Check-out target is missing or already closed.
    #[error("visit `{0}` not found or already checked out")]
    NotFound(VisitId),
    /// The search term was empty.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] EmptySearchTerm),
    /// The local store could not persist the change; nothing was committed.
    #[error("storage: {0}")]
    Storage(#[from] PersistError),
}

impl From<StoreError> for VisitError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => Self::Validation(err),
            StoreError::NotFound(id) | StoreError::AlreadyClosed(id) => Self::NotFound(id),
            StoreError::Persist(err) => Self::Storage(err),
        }
    }
}

/// Which best-effort step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStage {
    /// Mirroring the check-in to the system of record.
    CheckIn,
    /// Mirroring the check-out to the system of record.
    CheckOut,
    /// Resolving the host in the directory.
    HostLookup,
    /// Notifying the host.
    HostNotify,
}

/// Advisory failure attached to an otherwise successful operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteWarning {
    /// Step that failed.
    pub stage: RemoteStage,
    /// Reported failure.
    pub failure: RemoteFailure,
}

/// Committed record plus any advisory warnings raised on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitReceipt {
    /// Record as stored.
    pub record: VisitRecord,
    /// Remote failures that did not block the commit.
    pub warnings: Vec<RemoteWarning>,
}

/// Result of a check-out search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// First active visit matching the term.
    Found(VisitRecord),
    /// No active visit matches.
    NotFound,
}

/// Counts shown on the check-out dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisitStats {
    /// Visits without a check-out time.
    pub active: usize,
    /// Every visit in the store.
    pub total: usize,
    /// Visits whose check-in falls on the kiosk's current local date.
    pub checked_in_today: usize,
}

/// Orchestrates the visit lifecycle across the local store and the optional
/// remote collaborators.
pub struct VisitLifecycleManager<S> {
    store: S,
    remote: Option<Arc<dyn RemoteVisitSink>>,
    directory: Option<Arc<dyn VisitorDirectory>>,
    notifier: Option<Arc<dyn HostNotifier>>,
    clock: Arc<dyn Clock>,
}

impl<S: VisitRecordStore> VisitLifecycleManager<S> {
    /// Manager with no remote collaborators and the system clock.
    pub fn new(store: S) -> Self {
        Self {
            store,
            remote: None,
            directory: None,
            notifier: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Mirrors check-ins and check-outs to `sink`.
    pub fn with_remote(mut self, sink: Arc<dyn RemoteVisitSink>) -> Self {
        self.remote = Some(sink);
        self
    }

    /// Notifies hosts found in `directory` through `notifier` after check-in.
    pub fn with_host_notification(
        mut self,
        directory: Arc<dyn VisitorDirectory>,
        notifier: Arc<dyn HostNotifier>,
    ) -> Self {
        self.directory = Some(directory);
        self.notifier = Some(notifier);
        self
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates `draft`, mirrors it remotely when possible, and persists the
    /// new active visit.
    ///
    /// Remote failures never fail the check-in; they come back as warnings on
    /// the receipt and the visit keeps a locally generated id.
    pub async fn check_in(&mut self, draft: VisitDraft) -> Result<VisitReceipt, VisitError> {
        let draft = draft.normalized()?;
        let mut record = draft.into_record(VisitId::generate(), self.clock.now());
        let mut warnings = Vec::new();

        if let Some(remote) = self.remote.clone() {
            match remote.record_check_in(&record).await {
                Ok(remote_id) if self.store.get(&remote_id).is_some() => {
                    warnings.push(advisory(
                        RemoteStage::CheckIn,
                        &record.id,
                        RemoteFailure::Conflict(remote_id),
                    ));
                }
                Ok(remote_id) => record.id = remote_id,
                Err(failure) => warnings.push(advisory(RemoteStage::CheckIn, &record.id, failure)),
            }
        }

        let record = self.store.append(record)?;
        info!(visit_id = %record.id, remote_warnings = warnings.len(), "visitor checked in");

        if let (Some(directory), Some(notifier)) = (self.directory.clone(), self.notifier.clone()) {
            warnings.extend(notify_host(directory, notifier, &record).await);
        }

        Ok(VisitReceipt { record, warnings })
    }

    /// Finds the first active visit whose name or phone number matches `term`.
    pub fn find_active(&self, term: &str) -> Result<SearchOutcome, VisitError> {
        let term = SearchTerm::parse(term)?;
        let found = first_active_match(self.store.records(), &term).cloned();
        debug!(term_len = term.as_str().len(), found = found.is_some(), "check-out search");

        Ok(match found {
            Some(rec) => SearchOutcome::Found(rec),
            None => SearchOutcome::NotFound,
        })
    }

    /// Closes the active visit `id`, mirroring the check-out remotely first.
    pub async fn check_out(&mut self, id: &VisitId) -> Result<VisitReceipt, VisitError> {
        let current = self
            .store
            .get(id)
            .filter(VisitRecord::is_active)
            .ok_or_else(|| VisitError::NotFound(id.clone()))?;
        let close = CloseVisit {
            at: self.clock.now().max(current.check_in_time),
        };

        let mut warnings = Vec::new();
        if let Some(remote) = self.remote.clone() {
            if let Err(failure) = remote.record_check_out(id, close.at).await {
                warnings.push(advisory(RemoteStage::CheckOut, id, failure));
            }
        }

        let record = self.store.update(id, close)?;
        info!(visit_id = %record.id, remote_warnings = warnings.len(), "visitor checked out");
        Ok(VisitReceipt { record, warnings })
    }

    /// Record by id, active or closed.
    pub fn get(&self, id: &VisitId) -> Option<VisitRecord> {
        self.store.get(id)
    }

    /// Active visits in check-in order.
    pub fn active_visits(&self) -> Vec<VisitRecord> {
        self.store.active().into_iter().cloned().collect()
    }

    /// Every visit in check-in order.
    pub fn all_visits(&self) -> Vec<VisitRecord> {
        self.store.load_all()
    }

    /// Dashboard counts as of the manager's clock, with "today" taken in the
    /// host's local time zone.
    pub fn stats(&self) -> VisitStats {
        self.stats_in(&Local)
    }

    /// Dashboard counts with "today" taken in `tz`.
    pub fn stats_in<Tz: TimeZone>(&self, tz: &Tz) -> VisitStats {
        let today = self.clock.now().with_timezone(tz).date_naive();
        self.store
            .records()
            .into_iter()
            .fold(VisitStats::default(), |mut stats, rec| {
                stats.total += 1;
                if rec.is_active() {
                    stats.active += 1;
                }
                if rec.check_in_time.with_timezone(tz).date_naive() == today {
                    stats.checked_in_today += 1;
                }
                stats
            })
    }
}

async fn notify_host(
    directory: Arc<dyn VisitorDirectory>,
    notifier: Arc<dyn HostNotifier>,
    record: &VisitRecord,
) -> Option<RemoteWarning> {
    let person = record.person_to_meet.as_deref()?;
    let host = match directory.resolve(person).await {
        Ok(Some(host)) => host,
        Ok(None) => {
            debug!(visit_id = %record.id, "host not listed in directory, skipping notification");
            return None;
        }
        Err(failure) => return Some(advisory(RemoteStage::HostLookup, &record.id, failure)),
    };

    notifier
        .notify(&host, &record.visitor_name, &display_purpose(record))
        .await
        .err()
        .map(|failure| advisory(RemoteStage::HostNotify, &record.id, failure))
}

fn advisory(stage: RemoteStage, id: &VisitId, failure: RemoteFailure) -> RemoteWarning {
    warn!(visit_id = %id, ?stage, error = %failure, "remote step failed, continuing locally");
    RemoteWarning { stage, failure }
}
