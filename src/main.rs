//! Parley - voice/text assistant
//!
//! Main entry point: an interactive terminal session, or a scripted
//! scenario run with `--scenario`.

use anyhow::{Context, Result};
use clap::Parser;
use parley::processor::{Collaborators, Orchestrator, OrchestratorHandle};
use parley::testconfig::{Scenario, ScenarioRunner};
use parley::ui::TerminalRenderer;
use parley::AssistantConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "parley", version, about = "Voice and text assistant front-end")]
struct Cli {
    /// Configuration file (default: platform config dir, then built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a scenario file instead of an interactive session
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Log filter, e.g. "parley=trace" (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let config = AssistantConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.scenario {
        Some(path) => {
            let code = run_scenario(config, &path).await?;
            std::process::exit(code);
        }
        None => run_interactive(config).await,
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "parley=debug,info".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run_scenario(base: AssistantConfig, path: &Path) -> Result<i32> {
    let scenario = Scenario::load(path)?;
    let config = scenario.configure(base);

    let (collaborators, controls) = Collaborators::simulated(&config);
    let (orchestrator, handle) = Orchestrator::new(&config, collaborators)?;
    let task = orchestrator.start();

    let outcome = ScenarioRunner::new(scenario).run(&handle, &controls).await;
    for failure in &outcome.failures {
        warn!("[TEST] {}", failure);
    }

    shutdown(&handle, task, &config).await;
    Ok(outcome.exit_code)
}

async fn run_interactive(config: AssistantConfig) -> Result<()> {
    info!("Starting Parley assistant");
    let (collaborators, controls) = Collaborators::simulated(&config);
    let (orchestrator, handle) = Orchestrator::new(&config, collaborators)?;
    let renderer = TerminalRenderer::new(&handle).spawn()?;
    let task = orchestrator.start();

    println!("Enter: talk/stop   /say <text>: speak   /stop   /clear   /quit   other: type");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => handle.primary_action()?,
            "/quit" => break,
            "/stop" => handle.stop()?,
            "/clear" => handle.clear_reminders()?,
            _ => {
                if let Some(text) = line.strip_prefix("/say ") {
                    controls.utterances.say(text.trim());
                    handle.primary_action()?;
                } else {
                    handle.submit(line)?;
                }
            }
        }
    }

    shutdown(&handle, task, &config).await;
    if !matches!(
        tokio::task::spawn_blocking(move || renderer.join()).await,
        Ok(Ok(()))
    ) {
        warn!("Renderer did not exit cleanly");
    }
    Ok(())
}

async fn shutdown(handle: &OrchestratorHandle, task: JoinHandle<()>, config: &AssistantConfig) {
    if let Err(e) = handle.shutdown() {
        warn!("Failed to request shutdown: {}", e);
    }
    let timeout = Duration::from_millis(config.shutdown_timeout_ms);
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(())) => info!("Parley stopped"),
        Ok(Err(e)) => warn!("Orchestrator task failed: {}", e),
        Err(_) => warn!("Shutdown timeout reached, forcing exit"),
    }
}
