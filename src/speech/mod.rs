//! Speech capture and synthesis collaborators
//!
//! Native engines report back through callbacks of their own shape. Here
//! they are narrowed to two traits and two notifiers. A notifier is consumed
//! by the call that reports, so each session can report at most once; one
//! dropped without reporting reports "no result" / "finished" on its own, so
//! a session can never leave the assistant waiting forever.

pub mod capture;
pub mod synthesis;

pub use capture::{CaptureOutcome, ScriptedCapture, Utterance, UtteranceQueue};
pub use synthesis::{ConsoleSynthesizer, SpokenLog};

use crate::processor::Completion;
use crate::state::CycleId;
use crate::Result;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// One-shot speech capture
pub trait SpeechCapture: Send {
    /// Begin a capture session; the outcome is reported through `notifier`
    fn start(&mut self, notifier: CaptureNotifier) -> Result<()>;
}

/// Speech playback, one utterance at a time
pub trait SpeechSynthesis: Send {
    /// Speak `text`; completion is reported through `notifier`
    fn speak(&mut self, text: &str, notifier: PlaybackNotifier) -> Result<()>;

    /// Whether an utterance is currently playing
    fn is_speaking(&self) -> bool;

    /// Stop the current utterance, if any
    fn cancel(&mut self);
}

/// Reports the outcome of one capture session
#[must_use = "a capture session must report its outcome"]
pub struct CaptureNotifier {
    cycle: CycleId,
    tx: Option<UnboundedSender<Completion>>,
}

impl CaptureNotifier {
    pub fn new(cycle: CycleId, tx: UnboundedSender<Completion>) -> Self {
        Self { cycle, tx: Some(tx) }
    }

    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    /// Capture produced a transcript
    pub fn transcript(mut self, text: impl Into<String>) {
        self.deliver(CaptureOutcome::Transcript(text.into()));
    }

    /// Capture failed
    pub fn error(mut self, reason: impl Into<String>) {
        self.deliver(CaptureOutcome::Error(reason.into()));
    }

    /// Capture ended without anything usable
    pub fn no_result(mut self) {
        self.deliver(CaptureOutcome::NoResult);
    }

    fn deliver(&mut self, outcome: CaptureOutcome) {
        if let Some(tx) = self.tx.take() {
            let cycle = self.cycle;
            if tx.send(Completion::Capture { cycle, outcome }).is_err() {
                debug!("Orchestrator gone, dropping capture outcome for {}", cycle);
            }
        }
    }
}

impl Drop for CaptureNotifier {
    fn drop(&mut self) {
        self.deliver(CaptureOutcome::NoResult);
    }
}

/// Reports the end of one utterance
#[must_use = "a playback must report when it ends"]
pub struct PlaybackNotifier {
    cycle: CycleId,
    tx: Option<UnboundedSender<Completion>>,
}

impl PlaybackNotifier {
    pub fn new(cycle: CycleId, tx: UnboundedSender<Completion>) -> Self {
        Self { cycle, tx: Some(tx) }
    }

    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    /// The utterance has finished (or was cut short)
    pub fn finished(mut self) {
        self.deliver();
    }

    fn deliver(&mut self) {
        if let Some(tx) = self.tx.take() {
            let cycle = self.cycle;
            if tx.send(Completion::PlaybackFinished { cycle }).is_err() {
                debug!("Orchestrator gone, dropping playback end for {}", cycle);
            }
        }
    }
}

impl Drop for PlaybackNotifier {
    fn drop(&mut self) {
        self.deliver();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_capture_notifier_reports_once() {
        let (tx, mut rx) = unbounded_channel();
        let cycle = CycleId::default().next();

        CaptureNotifier::new(cycle, tx).transcript("hello");

        match rx.try_recv().unwrap() {
            Completion::Capture {
                cycle: got,
                outcome: CaptureOutcome::Transcript(text),
            } => {
                assert_eq!(got, cycle);
                assert_eq!(text, "hello");
            }
            other => panic!("Expected transcript, got {:?}", other),
        }
        // Drop after delivery must not report again
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_capture_notifier_reports_no_result() {
        let (tx, mut rx) = unbounded_channel();
        drop(CaptureNotifier::new(CycleId::default(), tx));

        assert!(matches!(
            rx.try_recv().unwrap(),
            Completion::Capture {
                outcome: CaptureOutcome::NoResult,
                ..
            }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_playback_notifier_reports_finished() {
        let (tx, mut rx) = unbounded_channel();
        let cycle = CycleId::default().next().next();
        drop(PlaybackNotifier::new(cycle, tx));

        assert!(matches!(
            rx.try_recv().unwrap(),
            Completion::PlaybackFinished { cycle: got } if got == cycle
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_notifier_survives_closed_channel() {
        let (tx, rx) = unbounded_channel();
        drop(rx);
        PlaybackNotifier::new(CycleId::default(), tx).finished();
    }
}
