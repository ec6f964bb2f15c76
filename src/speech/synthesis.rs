//! Console speech synthesis
//!
//! Logs each utterance and reports it finished after the time it would take
//! to say it.

use crate::config::SynthesisConfig;
use crate::speech::{PlaybackNotifier, SpeechSynthesis};
use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Record of everything that was sent to the speaker
#[derive(Clone, Default)]
pub struct SpokenLog {
    inner: Arc<Mutex<Vec<String>>>,
}

impl SpokenLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, text: &str) {
        self.inner.lock().push(text.to_string());
    }

    pub fn all(&self) -> Vec<String> {
        self.inner.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.inner.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

pub struct ConsoleSynthesizer {
    config: SynthesisConfig,
    spoken: SpokenLog,
    current: Option<JoinHandle<()>>,
}

impl ConsoleSynthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self {
            config,
            spoken: SpokenLog::new(),
            current: None,
        }
    }

    pub fn spoken(&self) -> SpokenLog {
        self.spoken.clone()
    }
}

impl SpeechSynthesis for ConsoleSynthesizer {
    fn speak(&mut self, text: &str, notifier: PlaybackNotifier) -> Result<()> {
        // Only one utterance may be pending
        self.cancel();

        let duration = self.config.utterance_duration(text);
        info!("Speaking ({:?}): {}", duration, text);
        self.spoken.push(text);

        self.current = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            notifier.finished();
        }));
        Ok(())
    }

    fn is_speaking(&self) -> bool {
        self.current.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.current.take() {
            if !handle.is_finished() {
                debug!("Cancelling current utterance");
            }
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Completion;
    use crate::state::CycleId;
    use std::time::Duration;
    use tokio::sync::mpsc::unbounded_channel;

    fn synthesizer() -> ConsoleSynthesizer {
        ConsoleSynthesizer::new(SynthesisConfig {
            ms_per_word: 100,
            min_duration_ms: 100,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_speak_reports_finished() {
        let mut synth = synthesizer();
        let (tx, mut rx) = unbounded_channel();
        let cycle = CycleId::default().next();

        synth
            .speak("Hello there", PlaybackNotifier::new(cycle, tx))
            .unwrap();
        assert!(synth.is_speaking());
        assert_eq!(synth.spoken().last().as_deref(), Some("Hello there"));

        assert!(matches!(
            rx.recv().await.unwrap(),
            Completion::PlaybackFinished { cycle: got } if got == cycle
        ));
        tokio::task::yield_now().await;
        assert!(!synth.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_playback() {
        let mut synth = synthesizer();
        let (tx, mut rx) = unbounded_channel();

        synth
            .speak(
                "a fairly long sentence to say",
                PlaybackNotifier::new(CycleId::default(), tx),
            )
            .unwrap();
        synth.cancel();
        assert!(!synth.is_speaking());

        // The aborted utterance still reports once, with its own cycle, so
        // the orchestrator can discard it as stale.
        let completion = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap();
        assert!(matches!(
            completion,
            Some(Completion::PlaybackFinished { .. })
        ));
        assert_eq!(synth.spoken().len(), 1);
    }
}
