//! Shared application state for the Parley assistant
//!
//! This module provides the state that is accessed by:
//! - **Orchestrator**: the only writer, applies transitions in response to
//!   commands and collaborator completions
//! - **UI**: reads snapshots for rendering, sends commands
//! - **ScenarioRunner**: reads snapshots for assertions, sends commands
//!
//! The design separates:
//! - **State**: shared data that can be queried synchronously
//! - **Commands**: requests to change state (sent to the orchestrator)
//! - **Events**: notifications that something changed (for repainting)

use chrono::{DateTime, Local, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Operating mode of the assistant
///
/// Exactly one value is active at any instant, and it alone decides which
/// user actions are accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistantStatus {
    /// Waiting for the user; the only state a new cycle may start from
    #[default]
    Idle,
    /// Speech capture in progress
    Listening,
    /// Waiting for the model reply
    Thinking,
    /// Reply being revealed character by character
    Typing,
    /// Reply being spoken
    Speaking,
}

impl AssistantStatus {
    pub const ALL: [AssistantStatus; 5] = [
        AssistantStatus::Idle,
        AssistantStatus::Listening,
        AssistantStatus::Thinking,
        AssistantStatus::Typing,
        AssistantStatus::Speaking,
    ];

    /// Check if idle
    pub fn is_idle(&self) -> bool {
        matches!(self, AssistantStatus::Idle)
    }

    /// Check if a reply is being delivered (the stoppable states)
    pub fn is_presenting(&self) -> bool {
        matches!(self, AssistantStatus::Typing | AssistantStatus::Speaking)
    }

    /// Whether the primary button does anything in this state
    pub fn accepts_primary_action(&self) -> bool {
        self.is_idle() || self.is_presenting()
    }

    /// Whether typed text may be submitted in this state
    pub fn accepts_text(&self) -> bool {
        self.is_idle()
    }

    /// Short status line for renderers
    pub fn hint(&self) -> &'static str {
        match self {
            AssistantStatus::Idle => "Tap to speak or type below",
            AssistantStatus::Listening => "Listening...",
            AssistantStatus::Thinking => "Thinking...",
            AssistantStatus::Typing => "Typing... (Tap to stop)",
            AssistantStatus::Speaking => "Speaking... (Tap to stop)",
        }
    }
}

impl std::fmt::Display for AssistantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssistantStatus::Idle => write!(f, "Idle"),
            AssistantStatus::Listening => write!(f, "Listening"),
            AssistantStatus::Thinking => write!(f, "Thinking"),
            AssistantStatus::Typing => write!(f, "Typing"),
            AssistantStatus::Speaking => write!(f, "Speaking"),
        }
    }
}

/// Who wrote a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    User,
    Assistant,
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Author::User => write!(f, "You"),
            Author::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One entry of the conversation log
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub author: Author,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(author: Author, text: impl Into<String>) -> Self {
        Self {
            author,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Local wall-clock time for display
    pub fn display_time(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub text: String,
}

/// The fixed set of controllable devices
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceId {
    #[serde(rename = "living room light")]
    LivingRoomLight,
    #[serde(rename = "bedroom light")]
    BedroomLight,
    #[serde(rename = "thermostat")]
    Thermostat,
}

impl DeviceId {
    pub const ALL: [DeviceId; 3] = [
        DeviceId::LivingRoomLight,
        DeviceId::BedroomLight,
        DeviceId::Thermostat,
    ];

    /// Identifier as the model refers to it
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceId::LivingRoomLight => "living room light",
            DeviceId::BedroomLight => "bedroom light",
            DeviceId::Thermostat => "thermostat",
        }
    }

    /// Label shown in the device panel
    pub fn display_name(&self) -> &'static str {
        match self {
            DeviceId::LivingRoomLight => "Living Room",
            DeviceId::BedroomLight => "Bedroom",
            DeviceId::Thermostat => "Thermostat",
        }
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeviceId {
    type Err = crate::ParleyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceId::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| crate::ParleyError::UnknownDevice(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    On,
    #[default]
    Off,
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceState::On => write!(f, "on"),
            DeviceState::Off => write!(f, "off"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IotDevice {
    pub id: DeviceId,
    pub name: String,
    pub state: DeviceState,
}

impl IotDevice {
    pub fn new(id: DeviceId) -> Self {
        Self {
            id,
            name: id.display_name().to_string(),
            state: DeviceState::Off,
        }
    }
}

/// Token identifying one conversational cycle
///
/// A new one is minted whenever a cycle starts or is cancelled. Every
/// asynchronous completion carries the token it was issued under and is
/// dropped if that token is no longer current.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CycleId(u64);

impl CycleId {
    pub fn next(self) -> Self {
        CycleId(self.0 + 1)
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unified application state
///
/// This is the single source of truth for application state.
/// It can be shared across threads using `SharedAppState`.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Current operating mode
    status: AssistantStatus,
    /// Transitions not yet published by the orchestrator
    transitions: Vec<(AssistantStatus, AssistantStatus)>,
    /// Conversation log (append-only, see `reveal_char`)
    messages: Vec<Message>,
    /// Reminders created by commands
    reminders: Vec<Reminder>,
    /// Fixed device set
    devices: Vec<IotDevice>,
    /// Text currently in the input box
    pub input_text: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Create a new state with the default device set
    pub fn new() -> Self {
        Self {
            status: AssistantStatus::Idle,
            transitions: Vec::new(),
            messages: Vec::new(),
            reminders: Vec::new(),
            devices: DeviceId::ALL.into_iter().map(IotDevice::new).collect(),
            input_text: String::new(),
        }
    }

    /// Create an immutable snapshot of current state
    pub fn snapshot(&self) -> AppStateSnapshot {
        AppStateSnapshot {
            status: self.status,
            messages: self.messages.clone(),
            reminders: self.reminders.clone(),
            devices: self.devices.clone(),
            input_text: self.input_text.clone(),
        }
    }

    // === Status ===

    pub fn status(&self) -> AssistantStatus {
        self.status
    }

    /// Move to a new status, recording the transition if it is one
    pub fn set_status(&mut self, to: AssistantStatus) {
        if self.status != to {
            self.transitions.push((self.status, to));
            self.status = to;
        }
    }

    /// Drain the transitions recorded since the last call
    pub fn take_transitions(&mut self) -> Vec<(AssistantStatus, AssistantStatus)> {
        std::mem::take(&mut self.transitions)
    }

    // === Message log ===

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Append a message to the log
    pub fn push_message(&mut self, author: Author, text: impl Into<String>) {
        self.messages.push(Message::new(author, text));
    }

    /// Extend the last message by one character
    ///
    /// This is the only mutation allowed on an appended message, and only the
    /// last assistant entry may receive it. Returns false if the last entry is
    /// not an assistant message.
    pub fn reveal_char(&mut self, c: char) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.author == Author::Assistant => {
                last.text.push(c);
                true
            }
            _ => false,
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    // === Reminders ===

    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    /// Add a reminder with a fresh id
    pub fn add_reminder(&mut self, text: impl Into<String>) -> Uuid {
        let id = Uuid::new_v4();
        self.reminders.push(Reminder {
            id,
            text: text.into(),
        });
        id
    }

    pub fn clear_reminders(&mut self) {
        self.reminders.clear();
    }

    // === Devices ===

    pub fn devices(&self) -> &[IotDevice] {
        &self.devices
    }

    pub fn device(&self, id: DeviceId) -> Option<&IotDevice> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Set a device's state; returns false if the device is not in the set
    pub fn set_device_state(&mut self, id: DeviceId, state: DeviceState) {
        if let Some(device) = self.devices.iter_mut().find(|d| d.id == id) {
            device.state = state;
        }
    }
}

/// Immutable snapshot of application state
///
/// Everything a renderer needs for one frame, read without holding locks.
#[derive(Clone, Debug)]
pub struct AppStateSnapshot {
    pub status: AssistantStatus,
    pub messages: Vec<Message>,
    pub reminders: Vec<Reminder>,
    pub devices: Vec<IotDevice>,
    pub input_text: String,
}

impl AppStateSnapshot {
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn device_state(&self, id: DeviceId) -> Option<DeviceState> {
        self.devices.iter().find(|d| d.id == id).map(|d| d.state)
    }
}

/// Thread-safe shared application state
///
/// This wraps `AppState` in `Arc<RwLock<>>` for safe concurrent access.
#[derive(Clone, Default)]
pub struct SharedAppState {
    inner: Arc<RwLock<AppState>>,
}

impl SharedAppState {
    /// Create a new shared state
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(AppState::new())),
        }
    }

    /// Get a read lock on the state
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, AppState> {
        self.inner.read()
    }

    /// Get a write lock on the state
    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, AppState> {
        self.inner.write()
    }

    /// Get a snapshot of current state (no lock held after return)
    pub fn snapshot(&self) -> AppStateSnapshot {
        self.inner.read().snapshot()
    }

    /// Get current status
    pub fn status(&self) -> AssistantStatus {
        self.inner.read().status
    }

    pub fn is_idle(&self) -> bool {
        self.status().is_idle()
    }

    pub fn reminder_count(&self) -> usize {
        self.inner.read().reminders.len()
    }
}

/// Commands that can be sent to control the assistant
///
/// These are the only requests a UI may originate.
#[derive(Clone, Debug)]
pub enum AppCommand {
    /// Main button: listen when idle, stop when typing/speaking
    PrimaryAction,
    /// Input box contents changed
    SetInputText(String),
    /// Submit the input box contents
    SubmitText,
    /// Trash button on the reminder panel
    ClearReminders,
    /// Cancel whatever is running and return to idle
    Stop,
    /// Shutdown the orchestrator
    Shutdown,
}

/// Events emitted by the orchestrator
///
/// These are used for UI updates and logging. State should be queried
/// directly from `SharedAppState` rather than reconstructed from events.
#[derive(Clone, Debug)]
pub enum AppEvent {
    /// Something other than the status changed (trigger repaint)
    StateChanged,
    /// Status moved from one mode to another
    StatusChanged {
        from: AssistantStatus,
        to: AssistantStatus,
    },
    /// Shutdown complete
    Shutdown,
}
