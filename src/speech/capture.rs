//! Scripted speech capture
//!
//! Each `start()` takes the next queued utterance and reports it after the
//! configured latency. An empty queue behaves like a microphone that heard
//! nothing.

use crate::config::CaptureConfig;
use crate::speech::{CaptureNotifier, SpeechCapture};
use crate::Result;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// What a capture session ended with
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Recognized speech
    Transcript(String),
    /// Capture failed (no microphone permission, network, ...)
    Error(String),
    /// Capture ended without a usable result
    NoResult,
}

/// What the next capture session will "hear"
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Utterance {
    Transcript(String),
    Error(String),
    Silence,
}

/// Shared queue of upcoming utterances
#[derive(Clone, Default)]
pub struct UtteranceQueue {
    inner: Arc<Mutex<VecDeque<Utterance>>>,
}

impl UtteranceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, utterance: Utterance) {
        self.inner.lock().push_back(utterance);
    }

    /// Queue a spoken sentence
    pub fn say(&self, text: impl Into<String>) {
        self.push(Utterance::Transcript(text.into()));
    }

    fn pop(&self) -> Option<Utterance> {
        self.inner.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

pub struct ScriptedCapture {
    latency: Duration,
    queue: UtteranceQueue,
}

impl ScriptedCapture {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            latency: Duration::from_millis(config.latency_ms),
            queue: UtteranceQueue::new(),
        }
    }

    /// Handle for queueing utterances from outside
    pub fn queue(&self) -> UtteranceQueue {
        self.queue.clone()
    }
}

impl SpeechCapture for ScriptedCapture {
    fn start(&mut self, notifier: CaptureNotifier) -> Result<()> {
        let utterance = self.queue.pop().unwrap_or(Utterance::Silence);
        let latency = self.latency;
        debug!("Capture {} started, will hear {:?}", notifier.cycle(), utterance);

        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            match utterance {
                Utterance::Transcript(text) => notifier.transcript(text),
                Utterance::Error(reason) => notifier.error(reason),
                Utterance::Silence => notifier.no_result(),
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Completion;
    use crate::state::CycleId;
    use tokio::sync::mpsc::unbounded_channel;

    fn capture() -> ScriptedCapture {
        ScriptedCapture::new(&CaptureConfig {
            enabled: true,
            latency_ms: 100,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivers_queued_transcript() {
        let mut capture = capture();
        capture.queue().say("Turn off the bedroom light");
        assert_eq!(capture.queue().len(), 1);

        let (tx, mut rx) = unbounded_channel();
        capture
            .start(CaptureNotifier::new(CycleId::default(), tx))
            .unwrap();
        assert!(capture.queue().is_empty());

        match rx.recv().await.unwrap() {
            Completion::Capture {
                outcome: CaptureOutcome::Transcript(text),
                ..
            } => assert_eq!(text, "Turn off the bedroom light"),
            other => panic!("Expected transcript, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_queue_hears_nothing() {
        let mut capture = capture();
        let (tx, mut rx) = unbounded_channel();
        capture
            .start(CaptureNotifier::new(CycleId::default(), tx))
            .unwrap();

        assert!(matches!(
            rx.recv().await.unwrap(),
            Completion::Capture {
                outcome: CaptureOutcome::NoResult,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_utterance() {
        let mut capture = capture();
        capture.queue().push(Utterance::Error("not-allowed".into()));
        let (tx, mut rx) = unbounded_channel();
        capture
            .start(CaptureNotifier::new(CycleId::default(), tx))
            .unwrap();

        assert!(matches!(
            rx.recv().await.unwrap(),
            Completion::Capture {
                outcome: CaptureOutcome::Error(reason),
                ..
            } if reason == "not-allowed"
        ));
    }
}
