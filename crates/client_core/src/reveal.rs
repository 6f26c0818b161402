use std::time::Duration;

use tokio::sync::watch;

use crate::effect::{EffectHandle, EffectPhase};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RevealProgress {
    pub phase: EffectPhase,
    pub shown: String,
    pub revealed: usize,
    pub total: usize,
}

/// Splits `text` into whitespace-delimited tokens. Each token keeps the
/// whitespace that follows it (leading whitespace stays on the first token),
/// so concatenating the tokens yields `text` unchanged.
pub fn reveal_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut seen_word = false;
    let mut in_gap = false;

    for (offset, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if seen_word {
                in_gap = true;
            }
        } else {
            if in_gap {
                tokens.push(&text[start..offset]);
                start = offset;
                in_gap = false;
            }
            seen_word = true;
        }
    }

    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

#[derive(Debug)]
pub struct Typewriter {
    progress: watch::Receiver<RevealProgress>,
    _handle: EffectHandle,
}

impl Typewriter {
    pub fn start<T, C>(text: String, interval: Duration, mut on_token: T, on_complete: C) -> Self
    where
        T: FnMut(&str) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let tokens: Vec<String> = reveal_tokens(&text)
            .into_iter()
            .map(str::to_string)
            .collect();
        let total = tokens.len();
        let (tx, progress) = watch::channel(RevealProgress {
            phase: EffectPhase::Running,
            shown: String::new(),
            revealed: 0,
            total,
        });

        let handle = EffectHandle::spawn(async move {
            let mut shown = String::with_capacity(text.len());
            for (index, token) in tokens.iter().enumerate() {
                tokio::time::sleep(interval).await;
                shown.push_str(token);
                on_token(token);
                tx.send_replace(RevealProgress {
                    phase: EffectPhase::Running,
                    shown: shown.clone(),
                    revealed: index + 1,
                    total,
                });
            }
            tx.send_replace(RevealProgress {
                phase: EffectPhase::Done,
                shown,
                revealed: total,
                total,
            });
            on_complete();
        });

        Self {
            progress,
            _handle: handle,
        }
    }

    pub fn progress(&self) -> RevealProgress {
        self.progress.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RevealProgress> {
        self.progress.clone()
    }
}
