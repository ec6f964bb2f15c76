//! Orchestrator: the assistant's status controller
//!
//! One tokio task owns every component and is the only writer of
//! `AppState`. It takes work from two queues:
//! - commands from the UI, scenario runner or tests (`AppCommand`)
//! - completions from capture, model, ticker and playback (`Completion`)
//!
//! Each event is handled to completion before the next is taken. Every
//! completion carries the cycle it belongs to; `stop_all` and each new turn
//! mint a fresh cycle, so anything arriving late from an abandoned turn is
//! recognized and dropped.
//!
//! The shared `AppState` can be queried by:
//! - UI for rendering
//! - ScenarioRunner for assertions

use crate::config::AssistantConfig;
use crate::llm::{create_session, ModelSession};
use crate::processor::dispatcher::dispatch;
use crate::processor::{Completion, ResponsePresenter, Route, SpeechInput, TranscriptProcessor};
use crate::speech::{
    ConsoleSynthesizer, ScriptedCapture, SpeechCapture, SpeechSynthesis, SpokenLog, UtteranceQueue,
};
use crate::state::{
    AppCommand, AppEvent, AppState, AppStateSnapshot, AssistantStatus, Author, CycleId,
    SharedAppState,
};
use crate::{ParleyError, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Said after the clear button empties the reminder list
pub const REMINDERS_CLEARED: &str = "Reminders cleared.";

/// External collaborators the orchestrator drives
pub struct Collaborators {
    /// Absent on platforms without speech capture
    pub capture: Option<Box<dyn SpeechCapture>>,
    pub synthesis: Box<dyn SpeechSynthesis>,
    /// Absent when the deployment is unconfigured
    pub model: Option<Arc<dyn ModelSession>>,
}

/// Handles for feeding and observing the simulated collaborators
#[derive(Clone)]
pub struct SimulatedControls {
    /// What the microphone will hear next
    pub utterances: UtteranceQueue,
    /// Everything sent to the speaker
    pub spoken: SpokenLog,
}

impl Collaborators {
    /// Scripted capture, console synthesis and a rule-based model session
    pub fn simulated(config: &AssistantConfig) -> (Self, SimulatedControls) {
        let capture = ScriptedCapture::new(&config.capture);
        let synthesis = ConsoleSynthesizer::new(config.synthesis.clone());
        let controls = SimulatedControls {
            utterances: capture.queue(),
            spoken: synthesis.spoken(),
        };

        let capture: Option<Box<dyn SpeechCapture>> = if config.capture.enabled {
            Some(Box::new(capture))
        } else {
            None
        };

        let collaborators = Self {
            capture,
            synthesis: Box::new(synthesis),
            model: create_session(&config.model),
        };
        (collaborators, controls)
    }
}

/// Handle for controlling the orchestrator from the UI or tests
///
/// This provides the public interface for:
/// - Sending commands (the UI callback set)
/// - Receiving events (for UI updates)
/// - Querying state (via SharedAppState)
#[derive(Clone)]
pub struct OrchestratorHandle {
    command_tx: UnboundedSender<AppCommand>,
    event_rx: Receiver<AppEvent>,
    state: SharedAppState,
}

impl OrchestratorHandle {
    /// Send a command to the orchestrator
    pub fn send_command(&self, cmd: AppCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| ParleyError::Channel(format!("Failed to send command: {}", e)))
    }

    /// Main button: listen when idle, stop when typing or speaking
    pub fn primary_action(&self) -> Result<()> {
        self.send_command(AppCommand::PrimaryAction)
    }

    /// Input box contents changed
    pub fn set_input_text(&self, text: impl Into<String>) -> Result<()> {
        self.send_command(AppCommand::SetInputText(text.into()))
    }

    /// Submit the input box contents
    pub fn submit_text(&self) -> Result<()> {
        self.send_command(AppCommand::SubmitText)
    }

    /// Type `text` into the input box and submit it
    pub fn submit(&self, text: impl Into<String>) -> Result<()> {
        self.set_input_text(text)?;
        self.submit_text()
    }

    /// Trash button on the reminder panel
    pub fn clear_reminders(&self) -> Result<()> {
        self.send_command(AppCommand::ClearReminders)
    }

    /// Cancel whatever is running
    pub fn stop(&self) -> Result<()> {
        self.send_command(AppCommand::Stop)
    }

    /// Request shutdown
    pub fn shutdown(&self) -> Result<()> {
        self.send_command(AppCommand::Shutdown)
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<AppEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Event receiver, for renderers running on their own thread
    pub fn events(&self) -> Receiver<AppEvent> {
        self.event_rx.clone()
    }

    /// Get the shared application state
    pub fn state(&self) -> &SharedAppState {
        &self.state
    }

    pub fn status(&self) -> AssistantStatus {
        self.state.status()
    }

    pub fn snapshot(&self) -> AppStateSnapshot {
        self.state.snapshot()
    }
}

/// The status controller
pub struct Orchestrator {
    state: SharedAppState,
    cycle: CycleId,

    command_rx: UnboundedReceiver<AppCommand>,
    completion_rx: UnboundedReceiver<Completion>,
    event_tx: Sender<AppEvent>,

    listener: SpeechInput,
    processor: TranscriptProcessor,
    presenter: ResponsePresenter,
}

impl Orchestrator {
    /// Create a new orchestrator
    ///
    /// Returns the orchestrator and a handle for controlling it.
    /// The orchestrator must be started with `start()` to begin processing.
    /// Fails if the configuration does not validate.
    pub fn new(
        config: &AssistantConfig,
        collaborators: Collaborators,
    ) -> Result<(Self, OrchestratorHandle)> {
        config.validate()?;
        let state = SharedAppState::new();

        let (command_tx, command_rx) = unbounded_channel();
        let (completion_tx, completion_rx) = unbounded_channel();
        let (event_tx, event_rx) = bounded(config.channel_buffer_size);

        let handle = OrchestratorHandle {
            command_tx,
            event_rx,
            state: state.clone(),
        };

        let orchestrator = Self {
            state,
            cycle: CycleId::default(),
            command_rx,
            completion_rx,
            event_tx,
            listener: SpeechInput::new(collaborators.capture, completion_tx.clone()),
            processor: TranscriptProcessor::new(collaborators.model, completion_tx.clone()),
            presenter: ResponsePresenter::new(
                collaborators.synthesis,
                config.typing_interval(),
                completion_tx,
            ),
        };

        Ok((orchestrator, handle))
    }

    /// Start the orchestrator loop on the current tokio runtime
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        info!("Orchestrator main loop starting");
        self.announce_startup_problems();
        self.publish();

        loop {
            tokio::select! {
                // Commands first, so a stop overtakes queued completions
                biased;

                cmd = self.command_rx.recv() => match cmd {
                    Some(AppCommand::Shutdown) => {
                        info!("Shutdown requested");
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd),
                    None => {
                        warn!("Command channel disconnected");
                        break;
                    }
                },

                Some(completion) = self.completion_rx.recv() => {
                    self.handle_completion(completion);
                }
            }
            self.publish();
        }

        self.stop_all();
        self.publish();
        self.emit(AppEvent::Shutdown);
        info!("Orchestrator shutdown complete");
    }

    fn handle_command(&mut self, cmd: AppCommand) {
        match cmd {
            AppCommand::PrimaryAction => self.primary_action(),
            AppCommand::SetInputText(text) => self.state.write().input_text = text,
            AppCommand::SubmitText => self.submit_text(),
            AppCommand::ClearReminders => self.clear_reminders(),
            AppCommand::Stop => self.stop_all(),
            AppCommand::Shutdown => {}
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        if completion.cycle() != self.cycle {
            debug!(
                "Dropping stale completion from {} (current {})",
                completion.cycle(),
                self.cycle
            );
            return;
        }

        let shared = self.state.clone();
        let mut state = shared.write();
        let cycle = self.cycle;

        match completion {
            Completion::Capture { outcome, .. } => {
                if let Some(transcript) = self.listener.on_outcome(&mut state, outcome) {
                    state.push_message(Author::User, transcript.clone());
                    self.think(&mut state, cycle, &transcript);
                }
            }
            Completion::ModelReply { reply, .. } => {
                if state.status() != AssistantStatus::Thinking {
                    debug!("Model reply while {}, ignoring", state.status());
                    return;
                }
                let route = self.processor.on_reply(reply);
                self.follow(&mut state, cycle, route);
            }
            Completion::Tick { .. } => {
                if state.status() == AssistantStatus::Typing {
                    self.presenter.tick(&mut state, cycle);
                }
            }
            Completion::PlaybackFinished { .. } => {
                self.presenter.playback_finished(&mut state);
            }
        }
    }

    fn primary_action(&mut self) {
        let status = self.state.status();
        if !status.accepts_primary_action() {
            debug!("Primary action ignored while {}", status);
            return;
        }
        if status.is_presenting() {
            info!("Stop requested while {}", status);
            self.stop_all();
            return;
        }

        if !self.listener.is_available() {
            debug!("Primary action ignored: no speech capture");
            return;
        }
        let cycle = self.begin_cycle();
        let shared = self.state.clone();
        let mut state = shared.write();
        self.listener.start(&mut state, cycle);
    }

    fn submit_text(&mut self) {
        let shared = self.state.clone();
        let mut state = shared.write();

        if !state.status().accepts_text() {
            debug!("Text submission ignored while {}", state.status());
            return;
        }
        let text = state.input_text.trim().to_string();
        if text.is_empty() {
            return;
        }

        state.input_text.clear();
        state.push_message(Author::User, text.clone());
        let cycle = self.begin_cycle();
        self.think(&mut state, cycle, &text);
    }

    fn clear_reminders(&mut self) {
        let shared = self.state.clone();
        let mut state = shared.write();

        let count = state.reminders().len();
        state.clear_reminders();
        info!("Reminder list cleared ({} removed)", count);

        if state.status().is_idle() {
            let cycle = self.begin_cycle();
            self.presenter.present(&mut state, cycle, REMINDERS_CLEARED, true);
        }
    }

    /// Cancel everything and force `Idle`
    ///
    /// Total and idempotent: safe from any status, any number of times.
    fn stop_all(&mut self) {
        let cycle = self.begin_cycle();
        let shared = self.state.clone();
        let mut state = shared.write();

        self.processor.cancel();
        self.presenter.cancel(&mut state);
        state.set_status(AssistantStatus::Idle);
        debug!("Stopped, now at {}", cycle);
    }

    fn think(&mut self, state: &mut AppState, cycle: CycleId, transcript: &str) {
        if let Some(route) = self.processor.process(state, cycle, transcript) {
            self.follow(state, cycle, route);
        }
    }

    fn follow(&mut self, state: &mut AppState, cycle: CycleId, route: Route) {
        let text = match route {
            Route::Dispatch(command) => dispatch(state, &command),
            Route::Present(text) => text,
        };
        self.presenter.present(state, cycle, &text, true);
    }

    /// Say, once, which capabilities are missing
    fn announce_startup_problems(&mut self) {
        let mut problems = Vec::new();
        if !self.processor.has_session() {
            problems.push(ParleyError::Configuration(
                "no model session could be created".to_string(),
            ));
        }
        if !self.listener.is_available() {
            problems.push(ParleyError::UnsupportedEnvironment(
                "no speech capture on this platform".to_string(),
            ));
        }
        if problems.is_empty() {
            return;
        }

        for problem in &problems {
            warn!("{}", problem);
        }
        let announcement = problems
            .iter()
            .map(ParleyError::user_message)
            .collect::<Vec<_>>()
            .join(" ");

        let cycle = self.begin_cycle();
        let shared = self.state.clone();
        let mut state = shared.write();
        self.presenter.present(&mut state, cycle, &announcement, false);
    }

    fn begin_cycle(&mut self) -> CycleId {
        self.cycle = self.cycle.next();
        self.cycle
    }

    /// Publish status transitions and a repaint request
    fn publish(&mut self) {
        let transitions = self.state.write().take_transitions();
        for (from, to) in transitions {
            info!("Status: {} -> {}", from, to);
            self.emit(AppEvent::StatusChanged { from, to });
        }
        self.emit(AppEvent::StateChanged);
    }

    fn emit(&self, event: AppEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                debug!("Event channel full, dropping {:?}", event);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}
