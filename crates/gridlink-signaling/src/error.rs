//! Error types for the signaling layer.

/// Errors that can occur during signaling.
///
/// Deliberately small: malformed session codes are *not* an error — they are
/// untrusted input, reported as `None` by
/// [`decode_session_code`](crate::decode_session_code).
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// The system clipboard could not be reached or written.
    /// Non-fatal by contract; manual copying always remains possible.
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
}
