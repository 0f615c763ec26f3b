//! Peer connection layer for Gridlink.
//!
//! Wraps a real-time data channel behind a deliberately narrow surface so
//! that nothing above this crate knows which transport is underneath:
//!
//! - [`PeerHandlers`] — the fixed set of five lifecycle callbacks.
//! - [`PeerLink`] — what an established connection can do: `send`, `close`.
//! - [`HostConnection`] / [`GuestConnection`] — the WebRTC data-channel
//!   implementation (feature `webrtc`, default), with the role-specific
//!   negotiation methods: the host creates an offer and accepts an answer,
//!   the guest consumes an offer and produces an answer.
//! - [`MemoryLink`] — an ordered, reliable in-process pair for tests and
//!   demos; no network, no negotiation, same callback semantics.
//!
//! # Message flow
//!
//! ```text
//! controller ──send(GameMessage)──→ link ──frame──→ wire
//! wire ──frame──→ link ──deserialize──→ on_message(GameMessage)
//! ```
//!
//! Inbound frames are deserialized *here*, before the controller sees them;
//! a frame that fails the protocol type guard is dropped with a debug log.
//! A garbled frame is not actionable by the caller, so it is not an error.
//!
//! # Disconnection
//!
//! The underlying connection reports failure through two native signals
//! (connection state and channel closure). This layer collapses them:
//! a transition to `Failed`/`Disconnected` fires [`on_close`] as well as
//! [`on_state_change`], and `on_close` fires at most once per connection.
//!
//! [`on_close`]: PeerHandlers::on_close
//! [`on_state_change`]: PeerHandlers::on_state_change

#![allow(async_fn_in_trait)]

mod error;
pub mod memory;
#[cfg(feature = "webrtc")]
mod rtc;

pub use error::PeerError;
pub use memory::MemoryLink;
#[cfg(feature = "webrtc")]
pub use rtc::{GuestConnection, HostConnection};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use gridlink_protocol::GameMessage;

// ---------------------------------------------------------------------------
// LinkState
// ---------------------------------------------------------------------------

/// Connection state as reported to [`PeerHandlers::on_state_change`].
///
/// Mirrors the underlying peer-connection state machine. `Failed` and
/// `Disconnected` additionally trigger `on_close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkState::New => "new",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
            LinkState::Disconnected => "disconnected",
            LinkState::Failed => "failed",
            LinkState::Closed => "closed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// PeerConfig
// ---------------------------------------------------------------------------

/// Connectivity configuration.
///
/// The defaults are all a serverless two-player session needs: a couple of
/// public STUN servers for address discovery (no TURN relay, no signaling
/// endpoint) and a single ordered/reliable channel.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// STUN server URLs handed to the peer-connection constructor.
    pub stun_servers: Vec<String>,

    /// Label of the data channel both sides use.
    pub channel_label: String,

    /// Upper bound on the wait for ICE candidate gathering.
    ///
    /// Gathering normally completes in well under a second, but a stalled
    /// gatherer must never hang the connection flow: when the bound is hit,
    /// negotiation proceeds with whatever candidates have been collected.
    pub gathering_timeout: Duration,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            stun_servers: vec![
                "stun:stun.l.google.com:19302".to_string(),
                "stun:stun1.l.google.com:19302".to_string(),
            ],
            channel_label: "game".to_string(),
            gathering_timeout: Duration::from_secs(10),
        }
    }
}

// ---------------------------------------------------------------------------
// PeerHandlers
// ---------------------------------------------------------------------------

/// The fixed set of five callbacks a connection reports through.
///
/// All callbacks default to no-ops; set the ones you care about:
///
/// ```rust
/// use gridlink_peer::PeerHandlers;
///
/// let handlers = PeerHandlers::new()
///     .on_open(|| println!("channel open"))
///     .on_message(|msg| println!("got {msg:?}"));
/// ```
///
/// Callbacks are invoked from the connection's internal tasks, hence the
/// `Send + Sync` bounds. Keep them quick — they run on the event path.
pub struct PeerHandlers {
    pub(crate) on_open: Box<dyn Fn() + Send + Sync>,
    pub(crate) on_message: Box<dyn Fn(GameMessage) + Send + Sync>,
    pub(crate) on_close: Box<dyn Fn() + Send + Sync>,
    pub(crate) on_error: Box<dyn Fn(PeerError) + Send + Sync>,
    pub(crate) on_state_change: Box<dyn Fn(LinkState) + Send + Sync>,
}

impl PeerHandlers {
    /// All five callbacks as no-ops.
    pub fn new() -> Self {
        Self {
            on_open: Box::new(|| {}),
            on_message: Box::new(|_| {}),
            on_close: Box::new(|| {}),
            on_error: Box::new(|_| {}),
            on_state_change: Box::new(|_| {}),
        }
    }

    /// Called once when the data channel opens.
    pub fn on_open(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Box::new(f);
        self
    }

    /// Called for every inbound message that passes the protocol type guard.
    pub fn on_message(mut self, f: impl Fn(GameMessage) + Send + Sync + 'static) -> Self {
        self.on_message = Box::new(f);
        self
    }

    /// Called at most once when the connection goes away, for any reason.
    pub fn on_close(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Box::new(f);
        self
    }

    /// Called on transport-level errors.
    pub fn on_error(mut self, f: impl Fn(PeerError) + Send + Sync + 'static) -> Self {
        self.on_error = Box::new(f);
        self
    }

    /// Called on every connection-state transition.
    pub fn on_state_change(mut self, f: impl Fn(LinkState) + Send + Sync + 'static) -> Self {
        self.on_state_change = Box::new(f);
        self
    }
}

impl Default for PeerHandlers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PeerHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PeerHandlers { .. }")
    }
}

/// Fires `on_close` exactly once, however many shutdown signals race in.
pub(crate) fn fire_close_once(closed: &AtomicBool, handlers: &PeerHandlers) {
    if !closed.swap(true, Ordering::SeqCst) {
        (handlers.on_close)();
    }
}

// ---------------------------------------------------------------------------
// PeerLink
// ---------------------------------------------------------------------------

/// What an established connection can do, transport-agnostic.
///
/// This is the seam the session controller is generic over: the WebRTC
/// connections and [`MemoryLink`] all implement it, so everything above can
/// be driven by either.
pub trait PeerLink: Send + Sync + 'static {
    /// Serializes and sends one message over the channel.
    fn send(
        &self,
        message: &GameMessage,
    ) -> impl std::future::Future<Output = Result<(), PeerError>> + Send;

    /// Closes the connection. Idempotent; no reconnection is attempted.
    fn close(&self) -> impl std::future::Future<Output = Result<(), PeerError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_default_handlers_are_callable_noops() {
        let h = PeerHandlers::new();
        (h.on_open)();
        (h.on_message)(GameMessage::game_reset());
        (h.on_close)();
        (h.on_error)(PeerError::ChannelClosed);
        (h.on_state_change)(LinkState::Connected);
    }

    #[test]
    fn test_fire_close_once_only_fires_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let h = PeerHandlers::new().on_close(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let closed = AtomicBool::new(false);

        fire_close_once(&closed, &h);
        fire_close_once(&closed, &h);
        fire_close_once(&closed, &h);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_config_is_serverless() {
        let config = PeerConfig::default();
        assert_eq!(config.channel_label, "game");
        assert_eq!(config.gathering_timeout, Duration::from_secs(10));
        assert!(
            config.stun_servers.iter().all(|s| s.starts_with("stun:")),
            "only STUN servers by default — no TURN, no signaling endpoint"
        );
    }

    #[test]
    fn test_link_state_display() {
        assert_eq!(LinkState::Connected.to_string(), "connected");
        assert_eq!(LinkState::Failed.to_string(), "failed");
    }
}
