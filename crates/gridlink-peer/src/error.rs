//! Error types for the peer layer.

/// Errors that can occur on a peer connection.
///
/// Inbound frame corruption is *not* represented here — malformed frames are
/// dropped (with a debug log) before they reach anyone, because a garbled
/// frame is not something the caller can act on. These errors cover the
/// operations a caller actually invokes: negotiating, sending, closing.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// The underlying WebRTC stack reported a failure.
    #[cfg(feature = "webrtc")]
    #[error("webrtc failure: {0}")]
    Rtc(#[from] webrtc::Error),

    /// Encoding an outbound message failed.
    #[error(transparent)]
    Protocol(#[from] gridlink_protocol::ProtocolError),

    /// `send` was called while the data channel is not open.
    #[error("data channel is not open")]
    ChannelClosed,

    /// Negotiation finished but no local description materialized.
    /// Indicates a misused or torn-down connection, not bad peer input.
    #[error("no local description available")]
    MissingDescription,
}
