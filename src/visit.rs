//! Visit domain record, check-in draft, and close transition types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{VisitId, VisitPurpose};

/// Check-in input rejected before anything was persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was absent or blank.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    /// A record with this id already exists in the store.
    #[error("visit id `{0}` already exists")]
    DuplicateId(VisitId),
}

/// Fully materialized, authoritative visit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    /// Stable visit identifier.
    pub id: VisitId,
    /// Visitor's full name.
    #[serde(alias = "fullName")]
    pub visitor_name: String,
    /// Host the visitor came to see.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_to_meet: Option<String>,
    /// Selected reason for the visit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<VisitPurpose>,
    /// Free-text justification, mandatory when the purpose is `other`.
    #[serde(default, alias = "otherReason", skip_serializing_if = "Option::is_none")]
    pub free_text_reason: Option<String>,
    /// Phone number, usable as an alternate search key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Opaque photo payload or pointer.
    #[serde(default, alias = "photo", skip_serializing_if = "Option::is_none")]
    pub photo_reference: Option<String>,
    /// Instant the visit started.
    pub check_in_time: DateTime<Utc>,
    /// Instant the visit ended; `None` while the visit is active.
    pub check_out_time: Option<DateTime<Utc>>,
}

impl VisitRecord {
    /// True while no check-out time has been recorded.
    pub fn is_active(&self) -> bool {
        self.check_out_time.is_none()
    }
}

/// Check-in payload submitted by the kiosk form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VisitDraft {
    /// Visitor's full name.
    pub visitor_name: String,
    /// Host the visitor came to see.
    pub person_to_meet: String,
    /// Selected reason; `None` until the visitor picks one.
    pub purpose: Option<VisitPurpose>,
    /// Free-text reason for [`VisitPurpose::Other`].
    pub free_text_reason: Option<String>,
    /// Optional phone number.
    pub phone_number: Option<String>,
    /// Optional photo payload.
    pub photo_reference: Option<String>,
}

impl VisitDraft {
    /// Trims every field, drops blank optionals, and enforces creation rules.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let visitor_name = self.visitor_name.trim().to_string();
        if visitor_name.is_empty() {
            return Err(ValidationError::MissingField("visitorName"));
        }

        let person_to_meet = self.person_to_meet.trim().to_string();
        if person_to_meet.is_empty() {
            return Err(ValidationError::MissingField("personToMeet"));
        }

        let purpose = self.purpose.ok_or(ValidationError::MissingField("purpose"))?;
        let free_text_reason = non_blank(self.free_text_reason);
        if purpose == VisitPurpose::Other && free_text_reason.is_none() {
            return Err(ValidationError::MissingField("freeTextReason"));
        }

        Ok(Self {
            visitor_name,
            person_to_meet,
            purpose: Some(purpose),
            // A reason typed before switching away from `other` is stale.
            free_text_reason: free_text_reason.filter(|_| purpose == VisitPurpose::Other),
            phone_number: non_blank(self.phone_number),
            photo_reference: non_blank(self.photo_reference),
        })
    }

    /// Builds the active record for an already normalized draft.
    pub fn into_record(self, id: VisitId, check_in_time: DateTime<Utc>) -> VisitRecord {
        VisitRecord {
            id,
            visitor_name: self.visitor_name,
            person_to_meet: Some(self.person_to_meet),
            purpose: self.purpose,
            free_text_reason: self.free_text_reason,
            phone_number: self.phone_number,
            photo_reference: self.photo_reference,
            check_in_time,
            check_out_time: None,
        }
    }
}

/// The single mutation a stored record accepts: closing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseVisit {
    /// Requested check-out instant.
    pub at: DateTime<Utc>,
}

impl CloseVisit {
    /// Stamps the check-out time, never earlier than the check-in time.
    pub fn apply_to(&self, rec: &mut VisitRecord) {
        rec.check_out_time = Some(self.at.max(rec.check_in_time));
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
