//! Runs the bundled scenario files against the simulated collaborators

use parley::processor::{Collaborators, Orchestrator};
use parley::testconfig::{Scenario, ScenarioOutcome, ScenarioRunner};
use parley::AssistantConfig;
use std::path::PathBuf;

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

async fn run(scenario: Scenario) -> ScenarioOutcome {
    let config = scenario.configure(AssistantConfig::new().with_channel_buffer_size(10_000));
    let (collaborators, controls) = Collaborators::simulated(&config);
    let (orchestrator, handle) = Orchestrator::new(&config, collaborators).unwrap();
    let _task = orchestrator.start();

    let outcome = ScenarioRunner::new(scenario).run(&handle, &controls).await;
    handle.shutdown().unwrap();
    outcome
}

async fn run_file(name: &str) -> ScenarioOutcome {
    let scenario = Scenario::load(scenario_path(name)).unwrap();
    run(scenario).await
}

fn assert_passed(outcome: &ScenarioOutcome) {
    assert!(
        outcome.passed,
        "Scenario '{}' failed: {:?}",
        outcome.name, outcome.failures
    );
    assert_eq!(outcome.exit_code, 0);
}

#[tokio::test(start_paused = true)]
async fn test_voice_reminder_scenario() {
    let outcome = run_file("voice_reminder.toml").await;
    assert_passed(&outcome);
    assert_eq!(outcome.executed, 8);
}

#[tokio::test(start_paused = true)]
async fn test_typed_devices_scenario() {
    assert_passed(&run_file("typed_devices.toml").await);
}

#[tokio::test(start_paused = true)]
async fn test_stop_while_typing_scenario() {
    assert_passed(&run_file("stop_while_typing.toml").await);
}

#[tokio::test(start_paused = true)]
async fn test_misheard_scenario() {
    assert_passed(&run_file("misheard.toml").await);
}

#[tokio::test(start_paused = true)]
async fn test_failed_assertion_sets_exit_code() {
    let scenario = Scenario::parse(
        r#"
        [scenario]
        name = "Wrong expectation"

        [model]
        fallback = "Hi."

        [[steps]]
        at_ms = 0
        action = { type = "log", message = "Nothing has happened yet" }
        assert = { type = "reminder_count", count = 2 }

        [[steps]]
        at_ms = 100
        action = { type = "exit", code = 0 }
        "#,
    )
    .unwrap();

    let outcome = run(scenario).await;
    assert!(!outcome.passed);
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(outcome.failures.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_exit_stops_remaining_steps() {
    let scenario = Scenario::parse(
        r#"
        [scenario]
        name = "Early exit"

        [model]
        fallback = "Hi."

        [[steps]]
        at_ms = 0
        action = { type = "exit", code = 4 }

        [[steps]]
        at_ms = 100
        action = { type = "log", message = "never reached" }
        assert = { type = "reminder_count", count = 9 }
        "#,
    )
    .unwrap();

    let outcome = run(scenario).await;
    assert!(outcome.passed);
    assert_eq!(outcome.exit_code, 4);
    assert_eq!(outcome.executed, 1);
}
