//! Parley - voice/text assistant front-end
//!
//! Captures speech or typed input, forwards it to a language model, and
//! delivers the reply either as a structured command (reminders, devices)
//! or as conversation, revealed character by character and then spoken.
//! The core is the status controller in `processor::orchestrator`, which
//! keeps the assistant consistent while capture, model round-trips, reveal
//! ticks and playback complete in any order.

pub mod command;
pub mod config;
pub mod error;
pub mod llm;
pub mod processor;
pub mod speech;
pub mod state;
pub mod testconfig;
pub mod ui;

// Re-export error types
pub use error::{ParleyError, Result};

pub use command::{parse_command, Command};
pub use config::AssistantConfig;
pub use processor::{Collaborators, Orchestrator, OrchestratorHandle, SimulatedControls};

// Re-export state types
pub use state::{
    AppCommand, AppEvent, AppState, AppStateSnapshot, AssistantStatus, Author, CycleId, DeviceId,
    DeviceState, IotDevice, Message, Reminder, SharedAppState,
};
