//! Line-oriented terminal renderer

use crate::processor::OrchestratorHandle;
use crate::state::{AppEvent, AppStateSnapshot, AssistantStatus, DeviceState, SharedAppState};
use crate::{ParleyError, Result};
use crossbeam_channel::Receiver;
use std::io::{self, Write};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Incremental view of the conversation
///
/// Remembers what has already been written so each render only adds what
/// is new: fresh messages, characters revealed since last time, and panel
/// changes.
#[derive(Default)]
pub struct TerminalView {
    shown_messages: usize,
    shown_chars: usize,
    line_open: bool,
    reminders: Vec<String>,
    devices: Vec<DeviceState>,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write whatever changed since the previous snapshot
    pub fn render<W: Write>(&mut self, snapshot: &AppStateSnapshot, out: &mut W) -> io::Result<()> {
        // Characters revealed into the message already on screen
        if self.shown_messages > 0 {
            if let Some(current) = snapshot.messages.get(self.shown_messages - 1) {
                let suffix: String = current.text.chars().skip(self.shown_chars).collect();
                if !suffix.is_empty() {
                    write!(out, "{}", suffix)?;
                    self.shown_chars += suffix.chars().count();
                }
            }
        }

        for message in snapshot.messages.iter().skip(self.shown_messages) {
            self.close_line(out)?;
            write!(
                out,
                "{} {}: {}",
                message.display_time(),
                message.author,
                message.text
            )?;
            self.line_open = true;
            self.shown_messages += 1;
            self.shown_chars = message.text.chars().count();
        }

        let reminders: Vec<String> = snapshot.reminders.iter().map(|r| r.text.clone()).collect();
        if reminders != self.reminders {
            self.close_line(out)?;
            if reminders.is_empty() {
                writeln!(out, "  Reminders: (none)")?;
            } else {
                writeln!(out, "  Reminders: {}", reminders.join("; "))?;
            }
            self.reminders = reminders;
        }

        let devices: Vec<DeviceState> = snapshot.devices.iter().map(|d| d.state).collect();
        if devices != self.devices {
            self.close_line(out)?;
            let panel: Vec<String> = snapshot
                .devices
                .iter()
                .map(|d| format!("{} {}", d.name, d.state))
                .collect();
            writeln!(out, "  Devices: {}", panel.join(", "))?;
            self.devices = devices;
        }

        out.flush()
    }

    /// Write a status line
    pub fn status<W: Write>(&mut self, status: AssistantStatus, out: &mut W) -> io::Result<()> {
        self.close_line(out)?;
        writeln!(out, "  [{}]", status.hint())?;
        out.flush()
    }

    fn close_line<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if self.line_open {
            writeln!(out)?;
            self.line_open = false;
        }
        Ok(())
    }
}

/// Draws the assistant to stdout from its own thread
pub struct TerminalRenderer {
    state: SharedAppState,
    events: Receiver<AppEvent>,
}

impl TerminalRenderer {
    pub fn new(handle: &OrchestratorHandle) -> Self {
        Self {
            state: handle.state().clone(),
            events: handle.events(),
        }
    }

    /// Run until the orchestrator shuts down
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("terminal-ui".to_string())
            .spawn(move || self.run())
            .map_err(|e| ParleyError::Io(format!("Failed to start renderer: {}", e)))
    }

    fn run(self) {
        let mut view = TerminalView::new();
        let stdout = io::stdout();

        for event in self.events.iter() {
            let mut out = stdout.lock();
            let result = match event {
                AppEvent::StateChanged => view.render(&self.state.snapshot(), &mut out),
                AppEvent::StatusChanged { to, .. } => view
                    .render(&self.state.snapshot(), &mut out)
                    .and_then(|_| view.status(to, &mut out)),
                AppEvent::Shutdown => break,
            };
            if let Err(e) = result {
                debug!("Renderer stopped: {}", e);
                break;
            }
        }
        debug!("Renderer exiting");
    }
}
