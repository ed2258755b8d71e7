//! Visit store, check-out matching, and derived visit values.

/// Pure functions over a single visit record.
pub mod derived;
/// Check-out search term and matching rule.
pub mod search;
/// Visit record store and its journal-backed implementation.
pub mod store;
