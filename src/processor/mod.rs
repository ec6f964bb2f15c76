//! Processing components of the assistant
//!
//! - **listener**: one-shot speech capture sessions
//! - **transcript**: the think step (model round-trip and reply routing)
//! - **dispatcher**: applies structured commands to state
//! - **presenter**: reveal animation and speech playback
//! - **orchestrator**: the status controller that owns all of the above and
//!   resolves races between their completions

pub mod dispatcher;
pub mod listener;
pub mod orchestrator;
pub mod presenter;
pub mod transcript;

pub use dispatcher::dispatch;
pub use listener::SpeechInput;
pub use orchestrator::{Collaborators, Orchestrator, OrchestratorHandle, SimulatedControls};
pub use presenter::ResponsePresenter;
pub use transcript::{Route, TranscriptProcessor};

use crate::speech::CaptureOutcome;
use crate::state::CycleId;
use crate::Result;

/// Asynchronous completions delivered to the orchestrator
///
/// Each one carries the cycle it was issued under; the orchestrator drops
/// any whose cycle is no longer current.
#[derive(Debug)]
pub enum Completion {
    /// A capture session ended
    Capture { cycle: CycleId, outcome: CaptureOutcome },
    /// The model answered (or the request failed)
    ModelReply { cycle: CycleId, reply: Result<String> },
    /// Reveal animation tick
    Tick { cycle: CycleId },
    /// Speech playback ended
    PlaybackFinished { cycle: CycleId },
}

impl Completion {
    pub fn cycle(&self) -> CycleId {
        match self {
            Completion::Capture { cycle, .. }
            | Completion::ModelReply { cycle, .. }
            | Completion::Tick { cycle }
            | Completion::PlaybackFinished { cycle } => *cycle,
        }
    }
}
