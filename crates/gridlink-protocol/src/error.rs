//! Error types for the protocol layer.

/// Errors that can occur while encoding or judging messages.
///
/// Note what is *not* here: decoding failures. Inbound frames are untrusted
/// by construction, so [`deserialize_message`](crate::deserialize_message)
/// reports a bad frame as `None` rather than as an error value — a garbled
/// frame is expected traffic, not an exceptional condition.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a message into a frame).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The message is well-formed but violates protocol rules.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
