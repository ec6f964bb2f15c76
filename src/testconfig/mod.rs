//! Scripted scenarios
//!
//! A scenario is a TOML file of timed steps (press the button, say
//! something, type a message, stop...) with optional assertions on the
//! assistant state. Scenarios drive the same `OrchestratorHandle` the
//! terminal UI uses, against the simulated collaborators.

mod runner;

pub use runner::{AssertionResult, ScenarioOutcome, ScenarioRunner};

use crate::config::AssistantConfig;
use crate::llm::ModelConfig;
use crate::state::{AssistantStatus, Author, DeviceId, DeviceState};
use crate::{ParleyError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// A scenario loaded from a TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Scenario metadata
    pub scenario: ScenarioMetadata,
    /// Model rules for this scenario; `None` keeps the configured model
    #[serde(default)]
    pub model: Option<ModelConfig>,
    /// Whether speech capture exists during this scenario
    #[serde(default = "default_capture_enabled")]
    pub capture_enabled: bool,
    /// Timed steps, in order
    pub steps: Vec<ScenarioStep>,
}

fn default_capture_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A single step with timing
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioStep {
    /// Milliseconds after scenario start
    pub at_ms: u64,
    pub action: StepAction,
    /// Checked right after the action has been applied
    #[serde(default)]
    pub assert: Option<Assertion>,
}

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepAction {
    /// Press the main button
    Press,
    /// Queue a transcript for the next capture session
    Say { text: String },
    /// Queue a capture error for the next capture session
    Mishear { reason: String },
    /// Next capture session hears nothing
    Silence,
    /// Put text in the input box
    Type { text: String },
    /// Submit the input box
    Submit,
    /// Press the trash button on the reminder panel
    ClearReminders,
    /// Stop everything
    Stop,
    /// Write a message to the log
    Log { message: String },
    /// End the scenario
    Exit {
        #[serde(default)]
        code: i32,
    },
}

/// Conditions checked against the assistant state
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    /// Current status
    Status { is: AssistantStatus },
    /// Number of reminders
    ReminderCount { count: usize },
    /// A reminder with exactly this text exists
    HasReminder { text: String },
    /// A device is in the given state
    DeviceState { device: DeviceId, state: DeviceState },
    /// Last message author and full text
    LastMessage { author: Author, text: String },
    /// Last message contains a substring (case-insensitive)
    LastMessageContains { text: String },
}

impl Scenario {
    /// Load a scenario from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ParleyError::Scenario(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::parse(&content)
            .map_err(|e| ParleyError::Scenario(format!("{}: {}", path.display(), e)))
    }

    /// Parse and validate a scenario
    pub fn parse(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)
            .map_err(|e| ParleyError::Scenario(format!("Failed to parse: {}", e)))?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(ParleyError::Scenario(
                "Scenario must have at least one step".to_string(),
            ));
        }

        let mut last = 0;
        for step in &self.steps {
            if step.at_ms < last {
                return Err(ParleyError::Scenario(format!(
                    "Steps must be ordered by time. Found step at {}ms after step at {}ms",
                    step.at_ms, last
                )));
            }
            last = step.at_ms;
        }

        if !self
            .steps
            .iter()
            .any(|s| matches!(s.action, StepAction::Exit { .. }))
        {
            return Err(ParleyError::Scenario(
                "Scenario must have an exit step".to_string(),
            ));
        }
        Ok(())
    }

    /// The assistant configuration this scenario runs with
    pub fn configure(&self, base: AssistantConfig) -> AssistantConfig {
        let mut config = match &self.model {
            Some(model) => base.with_model(model.clone()),
            None => base,
        };
        config.capture.enabled = self.capture_enabled;
        config
    }
}

impl ScenarioStep {
    /// Time from scenario start
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.at_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const REMINDER: &str = r#"
        [scenario]
        name = "Reminder by voice"

        [model]
        latency_ms = 100

        [[model.rules]]
        contains = "remind me"
        reply = '{"action":"ADD_REMINDER","payload":{"reminderText":"Call mom tomorrow"}}'

        [[steps]]
        at_ms = 0
        action = { type = "say", text = "Remind me to call mom tomorrow" }

        [[steps]]
        at_ms = 10
        action = { type = "press" }
        assert = { type = "status", is = "listening" }

        [[steps]]
        at_ms = 5000
        action = { type = "log", message = "done" }
        assert = { type = "has_reminder", text = "Call mom tomorrow" }

        [[steps]]
        at_ms = 5100
        action = { type = "exit" }
    "#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::parse(REMINDER).unwrap();
        assert_eq!(scenario.scenario.name, "Reminder by voice");
        assert!(scenario.capture_enabled);
        assert_eq!(scenario.steps.len(), 4);
        assert_eq!(
            scenario.steps[0].action,
            StepAction::Say {
                text: "Remind me to call mom tomorrow".into()
            }
        );
        assert_eq!(
            scenario.steps[1].assert,
            Some(Assertion::Status {
                is: AssistantStatus::Listening
            })
        );
        assert_eq!(scenario.steps[3].action, StepAction::Exit { code: 0 });

        let model = scenario.model.as_ref().unwrap();
        assert_eq!(model.latency_ms, 100);
        assert_eq!(model.rules.len(), 1);
    }

    #[test]
    fn test_parse_device_assertion() {
        let scenario = Scenario::parse(
            r#"
            [scenario]
            name = "Devices"

            [[steps]]
            at_ms = 0
            action = { type = "exit", code = 3 }
            assert = { type = "device_state", device = "bedroom light", state = "off" }
            "#,
        )
        .unwrap();

        assert_eq!(
            scenario.steps[0].assert,
            Some(Assertion::DeviceState {
                device: DeviceId::BedroomLight,
                state: DeviceState::Off,
            })
        );
    }

    #[test]
    fn test_rejects_unordered_steps() {
        let result = Scenario::parse(
            r#"
            [scenario]
            name = "Backwards"

            [[steps]]
            at_ms = 100
            action = { type = "press" }

            [[steps]]
            at_ms = 50
            action = { type = "exit" }
            "#,
        );
        assert!(matches!(result, Err(ParleyError::Scenario(_))));
    }

    #[test]
    fn test_rejects_missing_exit() {
        let result = Scenario::parse(
            r#"
            [scenario]
            name = "Endless"

            [[steps]]
            at_ms = 0
            action = { type = "stop" }
            "#,
        );
        assert!(matches!(result, Err(ParleyError::Scenario(_))));
    }

    #[test]
    fn test_configure_overrides_model_and_capture() {
        let mut scenario = Scenario::parse(REMINDER).unwrap();
        scenario.capture_enabled = false;

        let config = scenario.configure(AssistantConfig::default());
        assert!(!config.capture.enabled);
        assert!(config.model.is_configured());
        assert_eq!(config.model.latency_ms, 100);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", REMINDER).unwrap();

        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.steps.len(), 4);
        assert!(Scenario::load(file.path().with_extension("missing")).is_err());
    }
}
