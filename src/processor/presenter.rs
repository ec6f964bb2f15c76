//! Response presenter
//!
//! Delivers a finished reply either straight to speech or through a
//! character-by-character reveal that ends in speech. Owns the reveal ticker
//! and the speech synthesis collaborator.

use crate::processor::Completion;
use crate::speech::{PlaybackNotifier, SpeechSynthesis};
use crate::state::{AppState, AssistantStatus, Author, CycleId};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

/// An in-progress reveal
struct Animation {
    chars: Vec<char>,
    revealed: usize,
    ticker: JoinHandle<()>,
}

impl Animation {
    fn is_complete(&self) -> bool {
        self.revealed >= self.chars.len()
    }

    fn text(&self) -> String {
        self.chars.iter().collect()
    }
}

pub struct ResponsePresenter {
    synthesis: Box<dyn SpeechSynthesis>,
    typing_interval: Duration,
    completion_tx: UnboundedSender<Completion>,
    animation: Option<Animation>,
}

impl ResponsePresenter {
    pub fn new(
        synthesis: Box<dyn SpeechSynthesis>,
        typing_interval: Duration,
        completion_tx: UnboundedSender<Completion>,
    ) -> Self {
        Self {
            synthesis,
            // interval_at panics on a zero period
            typing_interval: typing_interval.max(Duration::from_millis(1)),
            completion_tx,
            animation: None,
        }
    }

    /// Whether a reveal ticker is running
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn is_speaking(&self) -> bool {
        self.synthesis.is_speaking()
    }

    /// Present `text` for `cycle`
    ///
    /// Empty text just returns to `Idle`.
    pub fn present(&mut self, state: &mut AppState, cycle: CycleId, text: &str, animate: bool) {
        self.stop_animation();

        if text.is_empty() {
            debug!("Nothing to present");
            state.set_status(AssistantStatus::Idle);
            return;
        }

        if !animate {
            state.push_message(Author::Assistant, text);
            self.speak(state, cycle, text);
            return;
        }

        state.push_message(Author::Assistant, "");
        state.set_status(AssistantStatus::Typing);

        let tx = self.completion_tx.clone();
        let period = self.typing_interval;
        let ticker = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tx.send(Completion::Tick { cycle }).is_err() {
                    break;
                }
            }
        });

        self.animation = Some(Animation {
            chars: text.chars().collect(),
            revealed: 0,
            ticker,
        });
    }

    /// Reveal one more character; on the last one, hand over to speech
    pub fn tick(&mut self, state: &mut AppState, cycle: CycleId) {
        let Some(animation) = self.animation.as_mut() else {
            debug!("Tick without an animation");
            return;
        };

        if let Some(&c) = animation.chars.get(animation.revealed) {
            if !state.reveal_char(c) {
                warn!("Last message is not the reply being revealed");
            }
            animation.revealed += 1;
        }

        if animation.is_complete() {
            if let Some(done) = self.animation.take() {
                done.ticker.abort();
                self.speak(state, cycle, &done.text());
            }
        }
    }

    /// Playback of the current cycle's utterance ended
    pub fn playback_finished(&mut self, state: &mut AppState) {
        if state.status() == AssistantStatus::Speaking {
            debug!("Playback finished");
            state.set_status(AssistantStatus::Idle);
        }
    }

    /// Stop playback and the ticker and force `Idle`
    pub fn cancel(&mut self, state: &mut AppState) {
        if let Some(animation) = &self.animation {
            info!(
                "Reveal stopped at {}/{} characters",
                animation.revealed,
                animation.chars.len()
            );
        }
        self.stop_animation();
        if self.synthesis.is_speaking() {
            info!("Speech stopped");
        }
        self.synthesis.cancel();
        state.set_status(AssistantStatus::Idle);
    }

    fn speak(&mut self, state: &mut AppState, cycle: CycleId, text: &str) {
        state.set_status(AssistantStatus::Speaking);
        let notifier = PlaybackNotifier::new(cycle, self.completion_tx.clone());
        if let Err(e) = self.synthesis.speak(text, notifier) {
            warn!("Speech synthesis failed: {}", e);
            state.set_status(AssistantStatus::Idle);
        }
    }

    fn stop_animation(&mut self) {
        if let Some(animation) = self.animation.take() {
            animation.ticker.abort();
        }
    }
}

impl Drop for ResponsePresenter {
    fn drop(&mut self) {
        self.stop_animation();
        self.synthesis.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SynthesisConfig;
    use crate::speech::{ConsoleSynthesizer, SpokenLog};
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn presenter() -> (ResponsePresenter, SpokenLog, UnboundedReceiver<Completion>) {
        let (tx, rx) = unbounded_channel();
        let synth = ConsoleSynthesizer::new(SynthesisConfig {
            ms_per_word: 100,
            min_duration_ms: 100,
        });
        let spoken = synth.spoken();
        (
            ResponsePresenter::new(Box::new(synth), Duration::from_millis(40), tx),
            spoken,
            rx,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_text_returns_to_idle() {
        let (mut presenter, spoken, _rx) = presenter();
        let mut state = AppState::new();
        state.set_status(AssistantStatus::Thinking);

        presenter.present(&mut state, CycleId::default(), "", true);

        assert!(state.status().is_idle());
        assert!(state.messages().is_empty());
        assert!(spoken.is_empty());
        assert!(!presenter.is_animating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_instant_presentation_speaks_then_idles() {
        let (mut presenter, spoken, mut rx) = presenter();
        let mut state = AppState::new();
        let cycle = CycleId::default().next();

        presenter.present(&mut state, cycle, "Hello there.", false);
        assert_eq!(state.status(), AssistantStatus::Speaking);
        assert_eq!(state.last_message().unwrap().text, "Hello there.");
        assert_eq!(spoken.last().as_deref(), Some("Hello there."));

        let Some(Completion::PlaybackFinished { cycle: got }) = rx.recv().await else {
            panic!("Expected playback end");
        };
        assert_eq!(got, cycle);
        presenter.playback_finished(&mut state);
        assert!(state.status().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_grows_one_char_per_tick() {
        let (mut presenter, spoken, mut rx) = presenter();
        let mut state = AppState::new();
        let cycle = CycleId::default().next();
        let text = "Olá!";

        presenter.present(&mut state, cycle, text, true);
        assert_eq!(state.status(), AssistantStatus::Typing);
        assert_eq!(state.last_message().unwrap().text, "");

        let n = text.chars().count();
        for i in 1..=n {
            let Some(Completion::Tick { cycle: got }) = rx.recv().await else {
                panic!("Expected tick");
            };
            assert_eq!(got, cycle);
            presenter.tick(&mut state, cycle);
            let shown: String = text.chars().take(i).collect();
            assert_eq!(state.last_message().unwrap().text, shown);
        }

        assert_eq!(state.status(), AssistantStatus::Speaking);
        assert!(!presenter.is_animating());
        assert_eq!(spoken.all(), vec![text.to_string()]);

        // Extra ticks never exceed the text
        presenter.tick(&mut state, cycle);
        assert_eq!(state.last_message().unwrap().text, text);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_keeps_partial_text() {
        let (mut presenter, spoken, mut rx) = presenter();
        let mut state = AppState::new();
        let cycle = CycleId::default();

        presenter.present(&mut state, cycle, "The weather in London is mild.", true);
        for _ in 0..3 {
            rx.recv().await.unwrap();
            presenter.tick(&mut state, cycle);
        }

        presenter.cancel(&mut state);
        assert!(state.status().is_idle());
        assert!(!presenter.is_animating());
        assert!(!presenter.is_speaking());
        assert_eq!(state.last_message().unwrap().text, "The");
        assert!(spoken.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_speech() {
        let (mut presenter, _spoken, _rx) = presenter();
        let mut state = AppState::new();

        presenter.present(&mut state, CycleId::default(), "Long enough to be cut short", false);
        assert!(presenter.is_speaking());

        presenter.cancel(&mut state);
        assert!(state.status().is_idle());
        assert!(!presenter.is_speaking());

        // Cancelling again is harmless
        presenter.cancel(&mut state);
        assert!(state.status().is_idle());
    }

    #[test]
    fn test_playback_end_ignored_unless_speaking() {
        let (tx, _rx) = unbounded_channel();
        let synth = ConsoleSynthesizer::new(SynthesisConfig::default());
        let mut presenter = ResponsePresenter::new(Box::new(synth), Duration::from_millis(40), tx);
        let mut state = AppState::new();
        state.set_status(AssistantStatus::Listening);

        presenter.playback_finished(&mut state);
        assert_eq!(state.status(), AssistantStatus::Listening);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_still_reveals() {
        let (tx, mut rx) = unbounded_channel();
        let synth = ConsoleSynthesizer::new(SynthesisConfig::default());
        let mut presenter = ResponsePresenter::new(Box::new(synth), Duration::ZERO, tx);
        let mut state = AppState::new();
        let cycle = CycleId::default();

        presenter.present(&mut state, cycle, "Hi", true);
        for _ in 0..2 {
            let Some(Completion::Tick { .. }) = rx.recv().await else {
                panic!("Expected tick");
            };
            presenter.tick(&mut state, cycle);
        }

        assert_eq!(state.last_message().unwrap().text, "Hi");
        assert_eq!(state.status(), AssistantStatus::Speaking);
    }
}
