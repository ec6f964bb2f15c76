//! Speech input controller
//!
//! Manages exactly one capture session at a time. Without a capture
//! collaborator it is inert.

use crate::processor::Completion;
use crate::speech::{CaptureNotifier, CaptureOutcome, SpeechCapture};
use crate::state::{AppState, AssistantStatus, CycleId};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

pub struct SpeechInput {
    capture: Option<Box<dyn SpeechCapture>>,
    completion_tx: UnboundedSender<Completion>,
}

impl SpeechInput {
    pub fn new(
        capture: Option<Box<dyn SpeechCapture>>,
        completion_tx: UnboundedSender<Completion>,
    ) -> Self {
        Self {
            capture,
            completion_tx,
        }
    }

    /// Whether a capture collaborator exists on this platform
    pub fn is_available(&self) -> bool {
        self.capture.is_some()
    }

    /// Start a capture session for `cycle`
    ///
    /// Only from `Idle` and only with a capture collaborator; otherwise
    /// nothing changes and false is returned.
    pub fn start(&mut self, state: &mut AppState, cycle: CycleId) -> bool {
        if !state.status().is_idle() {
            debug!("Not starting capture while {}", state.status());
            return false;
        }
        let Some(capture) = self.capture.as_mut() else {
            debug!("No speech capture available");
            return false;
        };

        let notifier = CaptureNotifier::new(cycle, self.completion_tx.clone());
        match capture.start(notifier) {
            Ok(()) => {
                state.set_status(AssistantStatus::Listening);
                info!("Listening ({})", cycle);
                true
            }
            Err(e) => {
                warn!("Failed to start capture: {}", e);
                false
            }
        }
    }

    /// Handle the outcome of the current session
    ///
    /// Returns the transcript to process, if there is one. Errors and empty
    /// results return to `Idle`, but only while still `Listening`.
    pub fn on_outcome(&mut self, state: &mut AppState, outcome: CaptureOutcome) -> Option<String> {
        if state.status() != AssistantStatus::Listening {
            debug!("Ignoring capture outcome while {}", state.status());
            return None;
        }

        match outcome {
            CaptureOutcome::Transcript(text) if !text.trim().is_empty() => {
                info!("Heard: {}", text.trim());
                Some(text.trim().to_string())
            }
            CaptureOutcome::Transcript(_) | CaptureOutcome::NoResult => {
                debug!("Capture ended without a result");
                state.set_status(AssistantStatus::Idle);
                None
            }
            CaptureOutcome::Error(reason) => {
                warn!("Capture error: {}", reason);
                state.set_status(AssistantStatus::Idle);
                None
            }
        }
    }
}
