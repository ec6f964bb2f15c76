//! Scenario runner
//!
//! Executes scenario steps at their scheduled times against a running
//! orchestrator and checks assertions on the resulting state.

use super::{Assertion, Scenario, StepAction};
use crate::processor::{OrchestratorHandle, SimulatedControls};
use crate::speech::Utterance;
use crate::state::AppStateSnapshot;
use crate::Result;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// Time given to the orchestrator to apply a command before asserting
const SETTLE: Duration = Duration::from_millis(5);

/// Result of an assertion check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionResult {
    Passed,
    Failed(String),
}

/// How a scenario ended
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub name: String,
    pub passed: bool,
    /// Exit code requested by the scenario, forced to 1 on failure
    pub exit_code: i32,
    pub executed: usize,
    pub failures: Vec<String>,
}

pub struct ScenarioRunner {
    scenario: Scenario,
    executed: usize,
    failures: Vec<String>,
    started: Option<Instant>,
}

impl ScenarioRunner {
    pub fn new(scenario: Scenario) -> Self {
        info!("[TEST] Loaded scenario: {}", scenario.scenario.name);
        if !scenario.scenario.description.is_empty() {
            info!("[TEST] Description: {}", scenario.scenario.description);
        }
        info!("[TEST] Total steps: {}", scenario.steps.len());

        Self {
            scenario,
            executed: 0,
            failures: Vec::new(),
            started: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn elapsed(&self) -> Duration {
        self.started
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// Run every step in order, then report
    pub async fn run(
        mut self,
        handle: &OrchestratorHandle,
        controls: &SimulatedControls,
    ) -> ScenarioOutcome {
        let start = Instant::now();
        self.started = Some(start);
        info!("[TEST] Scenario started: {}", self.scenario.scenario.name);

        let steps = self.scenario.steps.clone();
        let mut exit_code = 0;

        for step in &steps {
            tokio::time::sleep_until(start + step.delay()).await;
            debug!("[TEST] Executing step at {}ms: {:?}", step.at_ms, step.action);
            self.executed += 1;

            if let Err(e) = self.execute(&step.action, handle, controls) {
                error!("[TEST] FAIL: step at {}ms could not run: {}", step.at_ms, e);
                self.failures.push(e.to_string());
                break;
            }

            if let Some(assertion) = &step.assert {
                if sends_command(&step.action) {
                    tokio::time::sleep(SETTLE).await;
                }
                self.check_assertion(assertion, &handle.snapshot());
            }

            if let StepAction::Exit { code } = step.action {
                exit_code = code;
                break;
            }
        }

        info!("{}", self.summary());
        let passed = self.passed();
        ScenarioOutcome {
            name: self.scenario.scenario.name.clone(),
            passed,
            exit_code: if !passed && exit_code == 0 { 1 } else { exit_code },
            executed: self.executed,
            failures: self.failures,
        }
    }

    fn execute(
        &self,
        action: &StepAction,
        handle: &OrchestratorHandle,
        controls: &SimulatedControls,
    ) -> Result<()> {
        match action {
            StepAction::Press => handle.primary_action(),
            StepAction::Say { text } => {
                controls.utterances.say(text.clone());
                Ok(())
            }
            StepAction::Mishear { reason } => {
                controls.utterances.push(Utterance::Error(reason.clone()));
                Ok(())
            }
            StepAction::Silence => {
                controls.utterances.push(Utterance::Silence);
                Ok(())
            }
            StepAction::Type { text } => handle.set_input_text(text.clone()),
            StepAction::Submit => handle.submit_text(),
            StepAction::ClearReminders => handle.clear_reminders(),
            StepAction::Stop => handle.stop(),
            StepAction::Log { message } => {
                info!("[TEST] Log: {}", message);
                Ok(())
            }
            StepAction::Exit { code } => {
                info!("[TEST] Exit requested with code {}", code);
                Ok(())
            }
        }
    }

    /// Check an assertion against a state snapshot
    pub fn check_assertion(
        &mut self,
        assertion: &Assertion,
        snapshot: &AppStateSnapshot,
    ) -> AssertionResult {
        let result = evaluate(assertion, snapshot);

        match &result {
            AssertionResult::Passed => {
                info!("[TEST] PASS: Assertion {:?}", assertion);
            }
            AssertionResult::Failed(reason) => {
                error!("[TEST] FAIL: Assertion {:?} - {}", assertion, reason);
                self.failures.push(reason.clone());
            }
        }
        result
    }

    /// Get a summary of the scenario result
    pub fn summary(&self) -> String {
        let status = if self.passed() { "PASSED" } else { "FAILED" };
        format!(
            "[TEST] Scenario '{}' {}: Executed {} steps in {:?}",
            self.scenario.scenario.name,
            status,
            self.executed,
            self.elapsed()
        )
    }
}

fn sends_command(action: &StepAction) -> bool {
    matches!(
        action,
        StepAction::Press
            | StepAction::Type { .. }
            | StepAction::Submit
            | StepAction::ClearReminders
            | StepAction::Stop
    )
}

fn evaluate(assertion: &Assertion, snapshot: &AppStateSnapshot) -> AssertionResult {
    let check = |ok: bool, reason: String| {
        if ok {
            AssertionResult::Passed
        } else {
            AssertionResult::Failed(reason)
        }
    };

    match assertion {
        Assertion::Status { is } => check(
            snapshot.status == *is,
            format!("Expected status {}, got {}", is, snapshot.status),
        ),
        Assertion::ReminderCount { count } => check(
            snapshot.reminders.len() == *count,
            format!(
                "Expected {} reminders, got {}",
                count,
                snapshot.reminders.len()
            ),
        ),
        Assertion::HasReminder { text } => check(
            snapshot.reminders.iter().any(|r| r.text == *text),
            format!("No reminder '{}'", text),
        ),
        Assertion::DeviceState { device, state } => {
            let actual = snapshot.device_state(*device);
            check(
                actual == Some(*state),
                format!("Expected {} to be {}, got {:?}", device, state, actual),
            )
        }
        Assertion::LastMessage { author, text } => match snapshot.last_message() {
            Some(m) => check(
                m.author == *author && m.text == *text,
                format!(
                    "Expected last message {}: '{}', got {}: '{}'",
                    author, text, m.author, m.text
                ),
            ),
            None => AssertionResult::Failed("No messages".to_string()),
        },
        Assertion::LastMessageContains { text } => match snapshot.last_message() {
            Some(m) => check(
                m.text.to_lowercase().contains(&text.to_lowercase()),
                format!("Last message '{}' does not contain '{}'", m.text, text),
            ),
            None => AssertionResult::Failed("No messages".to_string()),
        },
    }
}
