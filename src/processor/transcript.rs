//! Transcript processor (the think step)
//!
//! Sends a transcript to the model session and decides what to do with the
//! reply: dispatch it as a command or present it as conversation.

use crate::command::{looks_like_command, parse_command, Command};
use crate::llm::ModelSession;
use crate::processor::Completion;
use crate::state::{AppState, AssistantStatus, CycleId};
use crate::Result;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Said when there is no model session at all
pub const NOT_CONNECTED: &str =
    "I'm having trouble connecting to my brain. Please check the model configuration.";

/// Where a reply goes next
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// Apply a command, then present its confirmation
    Dispatch(Command),
    /// Present this text as it is
    Present(String),
}

pub struct TranscriptProcessor {
    session: Option<Arc<dyn ModelSession>>,
    completion_tx: UnboundedSender<Completion>,
    in_flight: Option<JoinHandle<()>>,
}

impl TranscriptProcessor {
    pub fn new(
        session: Option<Arc<dyn ModelSession>>,
        completion_tx: UnboundedSender<Completion>,
    ) -> Self {
        Self {
            session,
            completion_tx,
            in_flight: None,
        }
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start thinking about `transcript`
    ///
    /// Moves to `Thinking` and sends the request. The reply arrives later as
    /// `Completion::ModelReply`. Without a session the route is known at once
    /// and returned directly.
    pub fn process(&mut self, state: &mut AppState, cycle: CycleId, transcript: &str) -> Option<Route> {
        state.set_status(AssistantStatus::Thinking);

        let Some(session) = self.session.clone() else {
            warn!("No model session, apologizing instead");
            return Some(Route::Present(NOT_CONNECTED.to_string()));
        };

        self.cancel();
        let tx = self.completion_tx.clone();
        let message = transcript.to_string();
        debug!("Sending to model ({}): {}", cycle, message);

        self.in_flight = Some(tokio::spawn(async move {
            let reply = session.send_message(&message).await;
            if tx.send(Completion::ModelReply { cycle, reply }).is_err() {
                debug!("Orchestrator gone, dropping model reply");
            }
        }));
        None
    }

    /// The model answered
    pub fn on_reply(&mut self, reply: Result<String>) -> Route {
        self.in_flight = None;
        match reply {
            Ok(text) => route_reply(&text),
            Err(e) => {
                if e.is_recoverable() {
                    warn!("Model request failed: {}", e);
                } else {
                    error!("Model session unusable: {}", e);
                }
                Route::Present(e.user_message())
            }
        }
    }

    /// Abandon the request in flight, if any
    pub fn cancel(&mut self) {
        if self.is_in_flight() {
            info!("Model request abandoned");
        }
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

impl Drop for TranscriptProcessor {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Decide how to handle a reply
///
/// Known commands and anything shaped like a command are dispatched (the
/// dispatcher apologizes for the unrecognized ones). Everything else is
/// conversation and is presented verbatim.
pub fn route_reply(reply: &str) -> Route {
    let command = parse_command(reply);
    if command.is_known() || looks_like_command(reply) {
        debug!("Reply is a command: {:?}", command);
        Route::Dispatch(command)
    } else {
        Route::Present(reply.trim().to_string())
    }
}
