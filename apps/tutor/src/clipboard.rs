use anyhow::Context;
use client_core::feedback::Clipboard;

/// System clipboard. A handle is opened per copy so no platform clipboard
/// object outlives the call.
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> anyhow::Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
        clipboard
            .set_text(text.to_string())
            .context("failed to write clipboard")
    }
}
