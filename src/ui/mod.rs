//! Terminal user interface
//!
//! A pure renderer: it draws snapshots of `AppState` when the orchestrator
//! says something changed and never mutates state itself. User input is
//! forwarded by the binary through `OrchestratorHandle`.

pub mod terminal;

pub use terminal::{TerminalRenderer, TerminalView};
