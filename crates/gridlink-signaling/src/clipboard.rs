//! Clipboard convenience wrapper.

use crate::SignalError;

/// Puts `text` on the system clipboard.
///
/// # Errors
/// Returns [`SignalError::Clipboard`] when no clipboard is available
/// (headless session, locked-down environment). Callers must treat this as
/// non-fatal: the code is still on screen and can be copied by hand.
pub fn copy_to_clipboard(text: &str) -> Result<(), SignalError> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| SignalError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| SignalError::Clipboard(e.to_string()))
}
