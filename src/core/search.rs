use thiserror::Error;

use crate::visit::VisitRecord;

/// Search term was empty after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("search term is empty")]
pub struct EmptySearchTerm;

/// Normalized check-out search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    raw: String,
    folded: String,
}

impl SearchTerm {
    /// Trims `input`; rejects a term that is empty afterwards.
    pub fn parse(input: &str) -> Result<Self, EmptySearchTerm> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(EmptySearchTerm);
        }
        Ok(Self {
            raw: raw.to_string(),
            folded: raw.to_lowercase(),
        })
    }

    /// Trimmed term as typed.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Case-insensitive substring of the name, or substring of the phone number.
    pub fn matches(&self, rec: &VisitRecord) -> bool {
        rec.visitor_name.to_lowercase().contains(&self.folded)
            || rec
                .phone_number
                .as_deref()
                .is_some_and(|phone| phone.contains(&self.raw))
    }
}

/// First active record matching `term`, in the iteration order given.
pub fn first_active_match<'a, I>(records: I, term: &SearchTerm) -> Option<&'a VisitRecord>
where
    I: IntoIterator<Item = &'a VisitRecord>,
{
    records
        .into_iter()
        .filter(|rec| rec.is_active())
        .find(|rec| term.matches(rec))
}
