//! Error types for the session layer, plus the unified crate error.

use gridlink_peer::PeerError;
use gridlink_protocol::ProtocolError;
use gridlink_signaling::SignalError;

/// Errors from the session controller and the host/join entry points.
///
/// These are caller-contract violations or unusable inputs — *not* peer
/// misbehavior, which is reported through the error callback instead (the
/// peer is untrusted; the caller is not).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// An operation that requires an open session was called while the
    /// status is not `Connected`.
    #[error("session is not connected")]
    NotConnected,

    /// No link has been attached to this controller yet.
    #[error("no active connection")]
    NoActiveConnection,

    /// A locally submitted move targets a cell that is not on the grid.
    #[error("cell index {0} out of range")]
    CellOutOfRange(u8),

    /// The pasted string is not a session code at all.
    #[error("malformed session code")]
    MalformedCode,

    /// The code decodes, but holds the wrong half of the negotiation
    /// (an answer where an offer was needed, or vice versa).
    #[error("expected an {expected} code")]
    WrongCodeKind { expected: &'static str },

    /// The code belongs to a different session than the one in progress.
    #[error("session code is for a different session")]
    SessionIdMismatch,
}

/// Top-level error that wraps all layer-specific errors.
///
/// Callers using the `gridlink` crate deal with this single type; the
/// `#[from]` impls let `?` lift each layer's error automatically.
#[derive(Debug, thiserror::Error)]
pub enum GridlinkError {
    /// Encoding a message failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Signaling failed (clipboard and friends).
    #[error(transparent)]
    Signal(#[from] SignalError),

    /// The peer connection failed.
    #[error(transparent)]
    Peer(#[from] PeerError),

    /// The session layer refused the operation.
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_peer_error() {
        let err: GridlinkError = PeerError::ChannelClosed.into();
        assert!(matches!(err, GridlinkError::Peer(_)));
        assert_eq!(err.to_string(), "data channel is not open");
    }

    #[test]
    fn test_from_session_error() {
        let err: GridlinkError = SessionError::NotConnected.into();
        assert!(matches!(err, GridlinkError::Session(_)));
        assert_eq!(err.to_string(), "session is not connected");
    }

    #[test]
    fn test_from_signal_error() {
        let err: GridlinkError = SignalError::Clipboard("no display".into()).into();
        assert!(matches!(err, GridlinkError::Signal(_)));
    }
}
