use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::sync::{broadcast, watch, Mutex};
use tracing::debug;

use crate::{
    effect::{EffectHandle, EffectSlot},
    TutorEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pane {
    Conversation,
    CodeEditor,
}

impl Pane {
    pub fn other(self) -> Self {
        match self {
            Self::Conversation => Self::CodeEditor,
            Self::CodeEditor => Self::Conversation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewPhase {
    #[default]
    Conversation,
    TransitioningToCode,
    CodeEditor,
    TransitioningToConversation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub text: &'static str,
    pub border: &'static str,
    pub accent: &'static str,
    pub logout_button: &'static str,
}

const LIGHT_PALETTE: Palette = Palette {
    background: "#ffffff",
    text: "#333333",
    border: "#dddddd",
    accent: "#6610f2",
    logout_button: "#1FACFF",
};

const DARK_PALETTE: Palette = Palette {
    background: "#121212",
    text: "#ffffff",
    border: "#333333",
    accent: "#6610f2",
    logout_button: "#1FACFF",
};

impl Theme {
    pub fn palette(self) -> Palette {
        match self {
            Self::Light => LIGHT_PALETTE,
            Self::Dark => DARK_PALETTE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub phase: ViewPhase,
    pub target: Pane,
    pub active: Pane,
    pub code_mounted: bool,
}

impl Default for ViewSnapshot {
    fn default() -> Self {
        Self {
            phase: ViewPhase::Conversation,
            target: Pane::Conversation,
            active: Pane::Conversation,
            code_mounted: false,
        }
    }
}

impl ViewSnapshot {
    pub fn is_mounted(&self, pane: Pane) -> bool {
        match pane {
            Pane::Conversation => true,
            Pane::CodeEditor => self.code_mounted,
        }
    }

    pub fn is_active(&self, pane: Pane) -> bool {
        self.active == pane
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(
            self.phase,
            ViewPhase::TransitioningToCode | ViewPhase::TransitioningToConversation
        )
    }

    pub fn theme(&self) -> Theme {
        match self.target {
            Pane::CodeEditor => Theme::Dark,
            Pane::Conversation => Theme::Light,
        }
    }
}

pub struct ViewController {
    state: Arc<watch::Sender<ViewSnapshot>>,
    transition: Mutex<EffectSlot>,
    generation: Arc<AtomicU64>,
    mount_delay: Duration,
    transition_duration: Duration,
    events: broadcast::Sender<TutorEvent>,
}

impl ViewController {
    pub fn new(
        mount_delay: Duration,
        transition_duration: Duration,
        events: broadcast::Sender<TutorEvent>,
    ) -> Self {
        let (state, _) = watch::channel(ViewSnapshot::default());
        Self {
            state: Arc::new(state),
            transition: Mutex::new(EffectSlot::default()),
            generation: Arc::new(AtomicU64::new(0)),
            mount_delay,
            transition_duration,
            events,
        }
    }

    pub async fn toggle(&self) -> Pane {
        let mut slot = self.transition.lock().await;
        slot.cancel();

        let mut toggled = (0, Pane::Conversation);
        self.state.send_modify(|view| {
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let target = view.target.other();
            *view = match target {
                Pane::CodeEditor => ViewSnapshot {
                    phase: ViewPhase::TransitioningToCode,
                    target,
                    active: view.active,
                    code_mounted: true,
                },
                Pane::Conversation => ViewSnapshot {
                    phase: ViewPhase::TransitioningToConversation,
                    target,
                    active: Pane::Conversation,
                    code_mounted: view.code_mounted,
                },
            };
            announce(&self.events, *view);
            toggled = (generation, target);
        });
        let (generation, target) = toggled;

        let step = Step {
            state: Arc::clone(&self.state),
            events: self.events.clone(),
            generation: Arc::clone(&self.generation),
            expected: generation,
        };
        let mount_delay = self.mount_delay;
        let transition = self.transition_duration;

        match target {
            Pane::CodeEditor => {
                slot.replace(EffectHandle::spawn(async move {
                    tokio::time::sleep(mount_delay).await;
                    step.apply(|view| view.active = Pane::CodeEditor);
                    tokio::time::sleep(transition).await;
                    step.apply(|view| view.phase = ViewPhase::CodeEditor);
                }));
            }
            Pane::Conversation => {
                slot.replace(EffectHandle::spawn(async move {
                    tokio::time::sleep(transition).await;
                    step.apply(|view| {
                        view.code_mounted = false;
                        view.phase = ViewPhase::Conversation;
                    });
                }));
            }
        }
        target
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.state.subscribe()
    }

    pub async fn shutdown(&self) {
        if self.transition.lock().await.cancel() {
            debug!("view transition cancelled");
        }
    }
}

fn announce(events: &broadcast::Sender<TutorEvent>, snapshot: ViewSnapshot) {
    debug!(phase = ?snapshot.phase, active = ?snapshot.active, code_mounted = snapshot.code_mounted, "view changed");
    let _ = events.send(TutorEvent::ViewChanged(snapshot));
}

/// A scheduled transition step. It only applies while its toggle is still
/// the latest one; the check and the change happen under the watch lock.
struct Step {
    state: Arc<watch::Sender<ViewSnapshot>>,
    events: broadcast::Sender<TutorEvent>,
    generation: Arc<AtomicU64>,
    expected: u64,
}

impl Step {
    fn apply(&self, change: impl FnOnce(&mut ViewSnapshot)) {
        self.state.send_if_modified(|view| {
            if self.generation.load(Ordering::SeqCst) != self.expected {
                debug!(generation = self.expected, "stale view step skipped");
                return false;
            }
            change(view);
            announce(&self.events, *view);
            true
        });
    }
}
