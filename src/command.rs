//! Structured commands the model may answer with
//!
//! A reply is either conversational text or a JSON object such as
//! `{"action":"TOGGLE_IOT","payload":{"deviceName":"bedroom light","state":"off"}}`.
//! Parsing is total: anything that does not match the vocabulary comes back as
//! `Command::Unknown`, never as an error.

use crate::state::{DeviceId, DeviceState};
use serde::Deserialize;
use serde_json::{json, Value};

/// A structured action requested by the model
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Add a reminder with the given text
    ///
    /// The text is never blank; build it with `Command::add_reminder`.
    /// A blank reminder does not survive `to_json` and comes back `Unknown`.
    AddReminder { reminder_text: String },
    /// Switch a device on or off
    ToggleIot { device: DeviceId, state: DeviceState },
    /// Remove every reminder
    ClearReminders,
    /// Anything that did not match the vocabulary
    Unknown,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReminderPayload {
    reminder_text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TogglePayload {
    device_name: DeviceId,
    state: DeviceState,
}

impl Command {
    /// Reminder command, or `Unknown` when the text is blank
    pub fn add_reminder(text: impl Into<String>) -> Command {
        let reminder_text = text.into();
        if reminder_text.trim().is_empty() {
            return Command::Unknown;
        }
        Command::AddReminder { reminder_text }
    }

    /// Wire action tag, if this is a known command
    pub fn action(&self) -> Option<&'static str> {
        match self {
            Command::AddReminder { .. } => Some("ADD_REMINDER"),
            Command::ToggleIot { .. } => Some("TOGGLE_IOT"),
            Command::ClearReminders => Some("CLEAR_REMINDERS"),
            Command::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Command::Unknown)
    }

    /// Serialize back into the wire form; `Unknown` has none
    pub fn to_json(&self) -> Option<String> {
        let action = self.action()?;
        let value = match self {
            Command::AddReminder { reminder_text } => json!({
                "action": action,
                "payload": { "reminderText": reminder_text },
            }),
            Command::ToggleIot { device, state } => json!({
                "action": action,
                "payload": { "deviceName": device.as_str(), "state": state.to_string() },
            }),
            _ => json!({ "action": action }),
        };
        Some(value.to_string())
    }

    fn from_value(value: &Value) -> Command {
        let Some(action) = value.get("action").and_then(Value::as_str) else {
            return Command::Unknown;
        };
        let payload = value.get("payload").cloned().unwrap_or(Value::Null);

        match action {
            "ADD_REMINDER" => match serde_json::from_value::<ReminderPayload>(payload) {
                Ok(p) => Command::add_reminder(p.reminder_text),
                Err(_) => Command::Unknown,
            },
            "TOGGLE_IOT" => match serde_json::from_value::<TogglePayload>(payload) {
                Ok(p) => Command::ToggleIot {
                    device: p.device_name,
                    state: p.state,
                },
                Err(_) => Command::Unknown,
            },
            "CLEAR_REMINDERS" => Command::ClearReminders,
            _ => Command::Unknown,
        }
    }
}

/// Strip a surrounding markdown code fence, if any
fn unfence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return trimmed;
    };
    // Drop a language tag such as ```json
    let inner = inner.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    inner.trim()
}

/// Parse a model reply into a command
///
/// Never fails: non-JSON text, unknown actions, missing fields and values
/// outside the device/state vocabulary all yield `Command::Unknown`.
pub fn parse_command(raw: &str) -> Command {
    match serde_json::from_str::<Value>(unfence(raw)) {
        Ok(value) => Command::from_value(&value),
        Err(_) => Command::Unknown,
    }
}

/// Whether a reply is shaped like a command (a JSON object), valid or not
pub fn looks_like_command(raw: &str) -> bool {
    serde_json::from_str::<Value>(unfence(raw))
        .map(|v| v.is_object())
        .unwrap_or(false)
}
