//! Visitor-lifecycle state for a front-desk kiosk: durable visit records,
//! best-effort mirroring to a remote system of record, and fuzzy check-out
//! matching.
//!
//! # Examples
//!
//! In-memory usage with [`lifecycle::VisitLifecycleManager`]:
//! ```
//! use visitlog::{
//!     core::store::VisitStore,
//!     lifecycle::{SearchOutcome, VisitLifecycleManager},
//!     types::VisitPurpose,
//!     visit::VisitDraft,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut manager = VisitLifecycleManager::new(VisitStore::in_memory());
//! let receipt = manager.check_in(VisitDraft {
//!     visitor_name: "Asha Rao".to_string(),
//!     person_to_meet: "Dev Patel".to_string(),
//!     purpose: Some(VisitPurpose::Delivery),
//!     ..VisitDraft::default()
//! }).await.expect("check in");
//! assert!(receipt.record.is_active());
//!
//! let SearchOutcome::Found(found) = manager.find_active("asha").expect("search") else {
//!     panic!("expected a match");
//! };
//! manager.check_out(&found.id).await.expect("check out");
//! assert_eq!(manager.find_active("asha").expect("search"), SearchOutcome::NotFound);
//! # }
//! ```
//!
//! Runtime usage with a SQLite store:
//! ```no_run
//! use visitlog::{config::KioskConfig, runtime::bootstrap::open_kiosk};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = KioskConfig::load("kiosk.json").expect("config");
//! let handle = open_kiosk(&config).expect("open store");
//! let outcome = handle.find_active("0412").await.expect("search");
//! println!("{outcome:?}");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![warn(missing_docs)]

/// Time source abstraction.
pub mod clock;
/// Kiosk configuration.
pub mod config;
/// Visit store, search, and derived values.
pub mod core;
/// Check-in and check-out orchestration.
pub mod lifecycle;
/// Mutation op model and persistence wrapper types.
pub mod op;
/// Persistence abstraction and SQLite implementation.
pub mod persist;
/// Remote system of record, directory, and notification seams.
pub mod remote;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Shared identifiers and enums.
pub mod types;
/// Visit domain records and drafts.
pub mod visit;
