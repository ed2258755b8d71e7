use std::fmt;

use chrono::{DateTime, Utc};

use crate::{types::VisitPurpose, visit::VisitRecord};

/// Span of a visit as whole hours plus remaining minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Elapsed {
    /// Whole hours.
    pub hours: i64,
    /// Minutes past the last whole hour.
    pub minutes: i64,
}

impl Elapsed {
    /// Span from `from` to `to`, clamped at zero.
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        let total = (to - from).num_minutes().max(0);
        Self {
            hours: total / 60,
            minutes: total % 60,
        }
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours, self.minutes)
    }
}

/// True while the visit has no check-out time.
pub fn is_active(rec: &VisitRecord) -> bool {
    rec.is_active()
}

/// Time spent so far by an active visit; `None` once the visit is closed.
pub fn elapsed(rec: &VisitRecord, now: DateTime<Utc>) -> Option<Elapsed> {
    rec.is_active()
        .then(|| Elapsed::between(rec.check_in_time, now))
}

/// Length of a visit: up to check-out when closed, up to `now` otherwise.
pub fn visit_duration(rec: &VisitRecord, now: DateTime<Utc>) -> Elapsed {
    Elapsed::between(rec.check_in_time, rec.check_out_time.unwrap_or(now))
}

/// Purpose label for display: the free-text reason for `other`, the
/// humanized code otherwise, and a dash when no purpose was recorded.
pub fn display_purpose(rec: &VisitRecord) -> String {
    match rec.purpose {
        Some(VisitPurpose::Other) => rec
            .free_text_reason
            .clone()
            .unwrap_or_else(|| VisitPurpose::Other.humanize()),
        Some(purpose) => purpose.humanize(),
        None => "—".to_string(),
    }
}
