use std::time::Duration;

use tokio::{sync::watch, time::Instant};

use crate::effect::{EffectHandle, EffectPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSettings {
    pub grace: Duration,
    pub tick: Duration,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            grace: Duration::from_millis(500),
            tick: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerReadout {
    #[default]
    Hidden,
    Ticking(Duration),
    Frozen(Duration),
}

impl TimerReadout {
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Hidden)
    }

    pub fn phase(&self) -> EffectPhase {
        match self {
            Self::Hidden => EffectPhase::Idle,
            Self::Ticking(_) => EffectPhase::Running,
            Self::Frozen(_) => EffectPhase::Done,
        }
    }

    pub fn label(&self) -> Option<String> {
        match self {
            Self::Hidden => None,
            Self::Ticking(elapsed) => Some(format!("답변 생성 중: {}", format_elapsed(*elapsed))),
            Self::Frozen(elapsed) => Some(format!("답변 생성 완료: {}", format_elapsed(*elapsed))),
        }
    }
}

/// `12.3초` below a minute, `1분 5초` from a minute on. Halves round up.
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis < 60_000 {
        let tenths = (millis + 50) / 100;
        format!("{}.{}초", tenths / 10, tenths % 10)
    } else {
        let minutes = millis / 60_000;
        let seconds = (millis % 60_000 + 500) / 1_000;
        format!("{minutes}분 {seconds}초")
    }
}

#[derive(Debug)]
pub struct ResponseTimer {
    started_at: Instant,
    readout: watch::Receiver<TimerReadout>,
    resolved: watch::Sender<Option<Instant>>,
    _handle: EffectHandle,
}

impl ResponseTimer {
    pub fn start(started_at: Instant, settings: TimerSettings) -> Self {
        let (readout_tx, readout) = watch::channel(TimerReadout::Hidden);
        let (resolved, mut resolved_rx) = watch::channel(None::<Instant>);

        let handle = EffectHandle::spawn(async move {
            tokio::select! {
                biased;
                _ = resolved_rx.changed() => return,
                _ = tokio::time::sleep_until(started_at + settings.grace) => {}
            }

            loop {
                let completed = *resolved_rx.borrow_and_update();
                if let Some(completed_at) = completed {
                    readout_tx.send_replace(TimerReadout::Frozen(
                        completed_at.saturating_duration_since(started_at),
                    ));
                    return;
                }
                readout_tx.send_replace(TimerReadout::Ticking(started_at.elapsed()));

                tokio::select! {
                    biased;
                    changed = resolved_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                    _ = tokio::time::sleep(settings.tick) => {}
                }
            }
        });

        Self {
            started_at,
            readout,
            resolved,
            _handle: handle,
        }
    }

    pub fn resolve(&self, completed_at: Instant) {
        self.resolved.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(completed_at);
            true
        });
    }

    pub fn readout(&self) -> TimerReadout {
        let current = *self.readout.borrow();
        match (*self.resolved.borrow(), current) {
            (Some(completed_at), TimerReadout::Ticking(_)) => {
                TimerReadout::Frozen(completed_at.saturating_duration_since(self.started_at))
            }
            _ => current,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerReadout> {
        self.readout.clone()
    }
}
