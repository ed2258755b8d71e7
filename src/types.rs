//! Shared identifiers and visit-related enums.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Monotonic operation sequence number.
pub type OpSeq = u64;

/// Opaque visit identifier, assigned by the remote sink or generated locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitId(String);

impl VisitId {
    /// Wraps an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random, locally unique identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrows the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VisitId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for VisitId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Fixed set of reasons a visitor can select at the kiosk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisitPurpose {
    /// Scheduled meeting with a member of staff.
    Meeting,
    /// Job interview.
    Interview,
    /// Package or goods delivery.
    Delivery,
    /// Maintenance or repair work.
    Maintenance,
    /// Personal, non-business visit.
    PersonalVisit,
    /// Anything else; requires a free-text reason.
    Other,
}

impl VisitPurpose {
    /// Wire code for this purpose, e.g. `personal-visit`.
    pub fn code(self) -> &'static str {
        match self {
            Self::Meeting => "meeting",
            Self::Interview => "interview",
            Self::Delivery => "delivery",
            Self::Maintenance => "maintenance",
            Self::PersonalVisit => "personal-visit",
            Self::Other => "other",
        }
    }

    /// Human-readable label: dashes become spaces and each word is capitalized.
    pub fn humanize(self) -> String {
        self.code()
            .split('-')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for VisitPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
