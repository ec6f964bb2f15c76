//! Command dispatcher
//!
//! Applies a command to reminders and devices and returns the phrase that
//! acknowledges it. Every command, `Unknown` included, gets exactly one.

use crate::command::Command;
use crate::state::AppState;
use crate::ParleyError;
use tracing::info;

pub fn dispatch(state: &mut AppState, command: &Command) -> String {
    match command {
        Command::AddReminder { reminder_text } => {
            state.add_reminder(reminder_text.clone());
            info!("Reminder added: {}", reminder_text);
            format!("OK, I've set a reminder for you: {}", reminder_text)
        }
        Command::ToggleIot { device, state: to } => {
            state.set_device_state(*device, *to);
            info!("Device {} turned {}", device, to);
            format!("Sure, I've turned the {} {}.", device, to)
        }
        Command::ClearReminders => {
            let count = state.reminders().len();
            state.clear_reminders();
            info!("Cleared {} reminders", count);
            "I've cleared all your reminders.".to_string()
        }
        Command::Unknown => {
            let err = ParleyError::Parse("reply matched no known command".to_string());
            info!("{}", err);
            err.user_message()
        }
    }
}
