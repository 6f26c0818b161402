use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tracing::warn;

use crate::effect::{EffectHandle, EffectSlot};

pub const CODE_FENCE_OPEN: &str = "```python";
pub const CODE_FENCE_CLOSE: &str = "```";

pub const COPY_LABEL: &str = "복사";
pub const COPIED_LABEL: &str = "복사됨";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackBlock {
    Paragraph(String),
    Code(String),
}

/// Splits a grading message into paragraphs and code fragments in one
/// left-to-right pass. An opening fence without a closing fence is not a
/// fragment: the rest of the message, fence included, stays plain text.
pub fn parse_feedback(message: &str) -> Vec<FeedbackBlock> {
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some(open_offset) = message[cursor..].find(CODE_FENCE_OPEN) {
        let open = cursor + open_offset;
        let body_start = open + CODE_FENCE_OPEN.len();
        let Some(close_offset) = message[body_start..].find(CODE_FENCE_CLOSE) else {
            break;
        };
        let close = body_start + close_offset;

        if open > cursor {
            blocks.push(FeedbackBlock::Paragraph(message[cursor..open].to_string()));
        }
        blocks.push(FeedbackBlock::Code(
            message[body_start..close].trim().to_string(),
        ));
        cursor = close + CODE_FENCE_CLOSE.len();
    }

    if cursor < message.len() {
        blocks.push(FeedbackBlock::Paragraph(message[cursor..].to_string()));
    }
    blocks
}

pub fn code_fragments(blocks: &[FeedbackBlock]) -> impl Iterator<Item = &str> {
    blocks.iter().filter_map(|block| match block {
        FeedbackBlock::Code(code) => Some(code.as_str()),
        FeedbackBlock::Paragraph(_) => None,
    })
}

pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> anyhow::Result<()>;
}

/// Copy affordance attached to one code block. The label flips to
/// [`COPIED_LABEL`] after a successful copy and reverts after `revert_after`.
#[derive(Debug)]
pub struct CopyButton {
    code: String,
    copied: Arc<AtomicBool>,
    revert: EffectSlot,
    revert_after: Duration,
}

impl CopyButton {
    pub fn new(code: impl Into<String>, revert_after: Duration) -> Self {
        Self {
            code: code.into(),
            copied: Arc::new(AtomicBool::new(false)),
            revert: EffectSlot::default(),
            revert_after,
        }
    }

    pub fn copy(&mut self, clipboard: &dyn Clipboard) -> bool {
        if let Err(err) = clipboard.write_text(&self.code) {
            warn!(error = %err, "copy to clipboard failed");
            return false;
        }

        self.copied.store(true, Ordering::SeqCst);
        let copied = Arc::clone(&self.copied);
        let revert_after = self.revert_after;
        self.revert.replace(EffectHandle::spawn(async move {
            tokio::time::sleep(revert_after).await;
            copied.store(false, Ordering::SeqCst);
        }));
        true
    }

    #[cfg(test)]
    pub(crate) fn code(&self) -> &str {
        &self.code
    }

    pub fn is_copied(&self) -> bool {
        self.copied.load(Ordering::SeqCst)
    }

    pub fn label(&self) -> &'static str {
        if self.is_copied() {
            COPIED_LABEL
        } else {
            COPY_LABEL
        }
    }
}
