//! Session state types: what a session looks like from the outside.

use std::fmt;

use gridlink_protocol::{Mark, SessionId};

// ---------------------------------------------------------------------------
// ConnectionStatus
// ---------------------------------------------------------------------------

/// Where a session is in its life.
///
/// ```text
///          host ┌──────────┐
///        ┌─────→│ Creating │──→ WaitingForPeer ──┐
///  Idle ─┤      └──────────┘                     ├──→ Connecting ──→ Connected
///        │      ┌──────────┐                     │
///        └─────→│ Joining  │─────────────────────┘
///         guest └──────────┘
/// ```
///
/// `Disconnected` and `Error` are reachable from any non-terminal state.
/// For one connection attempt, `Connected` is the success terminal and
/// `Disconnected`/`Error` the failure terminals. Moves are accepted only in
/// `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No session yet (a UI starting point; the controller itself is born
    /// into `Creating` or `Joining`).
    Idle,
    /// Host flow: building the connection and offer.
    Creating,
    /// Guest flow: consuming an offer.
    Joining,
    /// Host flow: offer published, waiting for the guest's answer.
    WaitingForPeer,
    /// Descriptions exchanged, transport negotiating.
    Connecting,
    /// Channel open; the game can flow.
    Connected,
    /// The session ended — peer left, transport died, or we left.
    Disconnected,
    /// The session is unusable (e.g. protocol version mismatch).
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStatus::Idle => "idle",
            ConnectionStatus::Creating => "creating",
            ConnectionStatus::Joining => "joining",
            ConnectionStatus::WaitingForPeer => "waiting-for-peer",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Error => "error",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Roles and players
// ---------------------------------------------------------------------------

/// Which side of the session this process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Created the offer. Plays the first-moving mark.
    Host,
    /// Joined via a session code and answered the offer.
    Guest,
}

impl Role {
    /// The mark this role plays: host is always the first mover.
    pub fn mark(self) -> Mark {
        match self {
            Role::Host => Mark::first(),
            Role::Guest => Mark::first().opponent(),
        }
    }
}

/// One participant as the local side sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    /// Display name.
    pub name: String,
    /// Display symbol — cosmetic only, distinct from `mark`. For the remote
    /// player this is the *locally resolved* symbol: if the peer proposes
    /// the same symbol the local player uses, a substitute is shown here.
    pub symbol: String,
    /// Game identity; drives turn order.
    pub mark: Mark,
}

// ---------------------------------------------------------------------------
// RemoteSession snapshot
// ---------------------------------------------------------------------------

/// A point-in-time view of the session, safe to hand to rendering code.
#[derive(Debug, Clone)]
pub struct RemoteSession {
    /// The six-character session label.
    pub session_id: SessionId,
    /// The code this side shares out of band (offer code for the host,
    /// answer code for the guest); `None` until produced.
    pub session_code: Option<String>,
    /// Current lifecycle state.
    pub status: ConnectionStatus,
    /// The local participant.
    pub local_player: PlayerRecord,
    /// The remote participant. Populated while `status` is `Connected`
    /// (their handshake supplies it); cleared when the session ends.
    pub remote_player: Option<PlayerRecord>,
    /// Last fatal error, if any.
    pub error: Option<String>,
    /// Whether this side created the offer.
    pub is_host: bool,
}

// ---------------------------------------------------------------------------
// Disconnects
// ---------------------------------------------------------------------------

/// How a session ended, as reported to
/// [`SessionCallbacks::on_disconnected`](crate::SessionCallbacks::on_disconnected).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectKind {
    /// The peer said goodbye before the channel closed.
    PeerLeft,
    /// The channel died without a goodbye: peer vanished, transport failed.
    ConnectionLost,
}

impl fmt::Display for DisconnectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectKind::PeerLeft => f.write_str("peer left"),
            DisconnectKind::ConnectionLost => f.write_str("connection lost"),
        }
    }
}

// ---------------------------------------------------------------------------
// The UI's view of the local game
// ---------------------------------------------------------------------------

/// Whether the local game is still accepting moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Moves are being played.
    Playing,
    /// Won or drawn; no further moves.
    Over,
}

/// What the controller needs to know about the local game to authorize
/// input. The UI owns the real board; this is the slice of it the
/// turn gate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardView {
    /// Whether the game is still running.
    pub phase: GamePhase,
    /// Whose turn the local board says it is.
    pub current_turn: Mark,
}

// ---------------------------------------------------------------------------
// SessionCallbacks
// ---------------------------------------------------------------------------

/// The caller-supplied event surface.
///
/// Control flows down (UI → controller → link → wire) and events flow back
/// up through these. All default to no-ops; set the ones the UI renders.
/// Invoked from the connection's event path — keep them quick and do not
/// block.
pub struct SessionCallbacks {
    pub(crate) on_status_change: Box<dyn Fn(ConnectionStatus) + Send + Sync>,
    pub(crate) on_remote_move: Box<dyn Fn(u8, Mark, u32) + Send + Sync>,
    pub(crate) on_peer_joined: Box<dyn Fn(String) + Send + Sync>,
    pub(crate) on_player_update: Box<dyn Fn(String, String) + Send + Sync>,
    pub(crate) on_rematch_requested: Box<dyn Fn() + Send + Sync>,
    pub(crate) on_rematch_declined: Box<dyn Fn() + Send + Sync>,
    pub(crate) on_game_reset: Box<dyn Fn(Mark) + Send + Sync>,
    pub(crate) on_error: Box<dyn Fn(String) + Send + Sync>,
    pub(crate) on_disconnected: Box<dyn Fn(DisconnectKind) + Send + Sync>,
}

impl SessionCallbacks {
    /// All callbacks as no-ops.
    pub fn new() -> Self {
        Self {
            on_status_change: Box::new(|_| {}),
            on_remote_move: Box::new(|_, _, _| {}),
            on_peer_joined: Box::new(|_| {}),
            on_player_update: Box::new(|_, _| {}),
            on_rematch_requested: Box::new(|| {}),
            on_rematch_declined: Box::new(|| {}),
            on_game_reset: Box::new(|_| {}),
            on_error: Box::new(|_| {}),
            on_disconnected: Box::new(|_| {}),
        }
    }

    /// The session's [`ConnectionStatus`] changed.
    pub fn on_status_change(
        mut self,
        f: impl Fn(ConnectionStatus) + Send + Sync + 'static,
    ) -> Self {
        self.on_status_change = Box::new(f);
        self
    }

    /// A validated remote move to apply locally: `(cell, mark, move_number)`.
    pub fn on_remote_move(mut self, f: impl Fn(u8, Mark, u32) + Send + Sync + 'static) -> Self {
        self.on_remote_move = Box::new(f);
        self
    }

    /// The peer's handshake arrived; argument is their display name.
    pub fn on_peer_joined(mut self, f: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.on_peer_joined = Box::new(f);
        self
    }

    /// The peer changed name or symbol: `(name, locally_resolved_symbol)`.
    pub fn on_player_update(
        mut self,
        f: impl Fn(String, String) + Send + Sync + 'static,
    ) -> Self {
        self.on_player_update = Box::new(f);
        self
    }

    /// The peer asked for a rematch; answer with
    /// [`respond_to_rematch`](crate::RemoteSessionController::respond_to_rematch).
    pub fn on_rematch_requested(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_rematch_requested = Box::new(f);
        self
    }

    /// The peer declined our rematch request.
    pub fn on_rematch_declined(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_rematch_declined = Box::new(f);
        self
    }

    /// A new game starts; argument is the mark that moves first.
    pub fn on_game_reset(mut self, f: impl Fn(Mark) + Send + Sync + 'static) -> Self {
        self.on_game_reset = Box::new(f);
        self
    }

    /// A protocol violation or transport error, human-readable. The session
    /// is not torn down automatically; the caller decides.
    pub fn on_error(mut self, f: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.on_error = Box::new(f);
        self
    }

    /// The session ended; the kind distinguishes a graceful goodbye from a
    /// vanished peer.
    pub fn on_disconnected(
        mut self,
        f: impl Fn(DisconnectKind) + Send + Sync + 'static,
    ) -> Self {
        self.on_disconnected = Box::new(f);
        self
    }
}

impl Default for SessionCallbacks {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionCallbacks { .. }")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_marks() {
        assert_eq!(Role::Host.mark(), Mark::X);
        assert_eq!(Role::Guest.mark(), Mark::O);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ConnectionStatus::WaitingForPeer.to_string(), "waiting-for-peer");
        assert_eq!(ConnectionStatus::Connected.to_string(), "connected");
    }

    #[test]
    fn test_disconnect_kind_display() {
        assert_eq!(DisconnectKind::PeerLeft.to_string(), "peer left");
        assert_eq!(DisconnectKind::ConnectionLost.to_string(), "connection lost");
    }

    #[test]
    fn test_default_callbacks_are_callable() {
        let cb = SessionCallbacks::new();
        (cb.on_status_change)(ConnectionStatus::Connected);
        (cb.on_remote_move)(4, Mark::X, 1);
        (cb.on_peer_joined)("peer".into());
        (cb.on_player_update)("peer".into(), "O".into());
        (cb.on_rematch_requested)();
        (cb.on_rematch_declined)();
        (cb.on_game_reset)(Mark::X);
        (cb.on_error)("nope".into());
        (cb.on_disconnected)(DisconnectKind::PeerLeft);
    }
}
