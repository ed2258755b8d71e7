//! Single-writer async runtime and event stream APIs.

/// Assembles a running kiosk from configuration.
pub mod bootstrap;
/// Event stream types emitted by the runtime.
pub mod events;
/// Handle and command loop implementation.
pub mod handle;
