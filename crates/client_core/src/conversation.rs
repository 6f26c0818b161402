use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    time::Instant,
};
use tracing::{debug, error, info, warn};

use crate::{
    backend::TutorBackend,
    reveal::{RevealProgress, Typewriter},
    session::Session,
    timer::{ResponseTimer, TimerReadout},
    TutorEvent, TutorSettings,
};

pub const CHAT_FAILURE_MESSAGE: &str = "오류가 발생했습니다. 다시 시도해주세요.";
pub const PENDING_ANSWER_LABEL: &str = "AI가 응답을 작성 중입니다";

pub const TYPING_DOTS_INTERVAL: std::time::Duration = std::time::Duration::from_millis(300);

pub fn typing_dots(step: usize) -> &'static str {
    ["", ".", "..", "..."][step % 4]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub user_text: String,
    pub assistant_text: Option<String>,
    pub is_pending: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Turn {
    fn pending(user_text: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            user_text: user_text.to_string(),
            assistant_text: None,
            is_pending: true,
            started_at,
            completed_at: None,
        }
    }

    fn resolve(&mut self, assistant_text: String, completed_at: DateTime<Utc>) {
        debug_assert!(self.is_pending, "turn resolved twice");
        self.assistant_text = Some(assistant_text);
        self.is_pending = false;
        self.completed_at = Some(completed_at);
    }
}

struct ActiveReveal {
    turn: usize,
    typewriter: Typewriter,
}

#[derive(Default)]
struct ConversationState {
    turns: Vec<Turn>,
    timers: Vec<Option<ResponseTimer>>,
    input: String,
    reveal: Option<ActiveReveal>,
    torn_down: bool,
}

/// Owned by the request task. If the task ends without completing its turn
/// (panic or abort), the turn is resolved as failed before loading clears.
struct TurnGuard {
    controller: Arc<ConversationController>,
    index: usize,
    completed: bool,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        if self.completed {
            self.controller.loading.store(false, Ordering::SeqCst);
            return;
        }
        let controller = Arc::clone(&self.controller);
        let index = self.index;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { controller.abandon_turn(index).await });
            }
            Err(_) => controller.loading.store(false, Ordering::SeqCst),
        }
    }
}

pub struct ConversationController {
    backend: Arc<dyn TutorBackend>,
    session: Arc<Session>,
    settings: TutorSettings,
    events: broadcast::Sender<TutorEvent>,
    loading: AtomicBool,
    state: Mutex<ConversationState>,
}

impl ConversationController {
    pub fn new(
        backend: Arc<dyn TutorBackend>,
        session: Arc<Session>,
        settings: TutorSettings,
        events: broadcast::Sender<TutorEvent>,
    ) -> Arc<Self> {
        Arc::new(Self {
            backend,
            session,
            settings,
            events,
            loading: AtomicBool::new(false),
            state: Mutex::new(ConversationState::default()),
        })
    }

    /// Returns the accepted turn's index, or `None` for blank input or while
    /// another turn is pending. Failures resolve the turn with
    /// [`CHAT_FAILURE_MESSAGE`].
    pub async fn submit(self: &Arc<Self>, text: &str) -> Option<usize> {
        if text.trim().is_empty() {
            debug!("ignoring blank chat input");
            return None;
        }
        if self
            .loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("chat turn rejected while another is pending");
            return None;
        }

        let index = {
            let mut state = self.state.lock().await;
            state.reveal = None;
            state.torn_down = false;
            state.turns.push(Turn::pending(text, Utc::now()));
            state
                .timers
                .push(Some(ResponseTimer::start(Instant::now(), self.settings.timer())));
            state.turns.len() - 1
        };
        let _ = self.events.send(TutorEvent::TurnStarted { turn: index });

        let controller = Arc::clone(self);
        let message = text.to_string();
        let request = tokio::spawn(async move {
            let guard = TurnGuard {
                controller: Arc::clone(&controller),
                index,
                completed: false,
            };
            controller.complete_turn(index, &message, guard).await;
        });
        if let Err(err) = request.await {
            error!(turn = index, error = %err, "chat request task failed");
            self.abandon_turn(index).await;
        }
        Some(index)
    }

    async fn complete_turn(
        self: &Arc<Self>,
        index: usize,
        message: &str,
        mut guard: TurnGuard,
    ) {
        let identity = self.session.identity().await;
        info!(turn = index, identity = %identity, "sending chat turn");
        let outcome = self.backend.chat(message, &identity).await;

        let succeeded = outcome.is_ok();
        let assistant_text = outcome.unwrap_or_else(|err| {
            warn!(turn = index, error = %err, "chat request failed");
            CHAT_FAILURE_MESSAGE.to_string()
        });

        let mut state = self.state.lock().await;
        state.turns[index].resolve(assistant_text.clone(), Utc::now());
        guard.completed = true;
        if let Some(Some(timer)) = state.timers.get(index) {
            timer.resolve(Instant::now());
        }
        state.input.clear();
        if succeeded && !state.torn_down {
            state.reveal = Some(ActiveReveal {
                turn: index,
                typewriter: self.start_reveal(index, assistant_text),
            });
        }
        drop(state);
        drop(guard);

        let _ = self.events.send(TutorEvent::TurnResolved {
            turn: index,
            succeeded,
        });
    }

    async fn abandon_turn(&self, index: usize) {
        let mut state = self.state.lock().await;
        match state.turns.get_mut(index) {
            Some(turn) if turn.is_pending => {
                turn.resolve(CHAT_FAILURE_MESSAGE.to_string(), Utc::now());
            }
            _ => return,
        }
        if let Some(Some(timer)) = state.timers.get(index) {
            timer.resolve(Instant::now());
        }
        state.input.clear();
        drop(state);
        self.loading.store(false, Ordering::SeqCst);

        warn!(turn = index, "chat turn abandoned by its request task");
        let _ = self.events.send(TutorEvent::TurnResolved {
            turn: index,
            succeeded: false,
        });
    }

    fn start_reveal(&self, turn: usize, text: String) -> Typewriter {
        let token_events = self.events.clone();
        let done_events = self.events.clone();
        Typewriter::start(
            text,
            self.settings.reveal_interval,
            move |token| {
                let _ = token_events.send(TutorEvent::RevealToken {
                    turn,
                    token: token.to_string(),
                });
            },
            move || {
                let _ = done_events.send(TutorEvent::RevealCompleted { turn });
            },
        )
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn turns(&self) -> Vec<Turn> {
        self.state.lock().await.turns.clone()
    }

    pub async fn turn(&self, index: usize) -> Option<Turn> {
        self.state.lock().await.turns.get(index).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.turns.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn input(&self) -> String {
        self.state.lock().await.input.clone()
    }

    pub async fn set_input(&self, text: impl Into<String>) {
        self.state.lock().await.input = text.into();
    }

    pub async fn submit_input(self: &Arc<Self>) -> Option<usize> {
        let text = self.input().await;
        self.submit(&text).await
    }

    pub async fn timer(&self, index: usize) -> TimerReadout {
        self.state
            .lock()
            .await
            .timers
            .get(index)
            .and_then(Option::as_ref)
            .map(ResponseTimer::readout)
            .unwrap_or_default()
    }

    pub async fn reveal(&self) -> Option<(usize, RevealProgress)> {
        let state = self.state.lock().await;
        state
            .reveal
            .as_ref()
            .map(|active| (active.turn, active.typewriter.progress()))
    }

    /// Stops the running reveal and every elapsed-time ticker. Turns keep
    /// their data; a pending turn still resolves when its answer arrives.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        state.reveal = None;
        for timer in &mut state.timers {
            timer.take();
        }
        state.torn_down = true;
        debug!(turns = state.turns.len(), "conversation effects cancelled");
    }
}

#[cfg(test)]
#[path = "tests/conversation_tests.rs"]
mod tests;
