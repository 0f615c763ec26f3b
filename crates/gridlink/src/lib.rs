//! # Gridlink
//!
//! A serverless peer-to-peer session layer for two-player turn-based grid
//! games: no backend, no matchmaking — two processes exchange a pair of
//! copy-pasteable codes and then speak a typed game protocol directly over
//! a data channel, while a per-session controller keeps the two
//! independently running game states in lockstep.
//!
//! The stack, leaves first:
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ gridlink (this crate)                         │
//! │   RemoteSessionController — turn order, move  │
//! │   sequencing, rematch races, disconnects      │
//! ├────────────────────────┬──────────────────────┤
//! │ gridlink-peer          │ gridlink-signaling   │
//! │   data channel wrapper │   session codes,     │
//! │   (WebRTC / in-memory) │   join links         │
//! ├────────────────────────┴──────────────────────┤
//! │ gridlink-protocol                             │
//! │   message shapes, type guards, validation     │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gridlink::prelude::*;
//!
//! # async fn run() -> Result<(), GridlinkError> {
//! // Hosting side:
//! let hosted = host_session("ada", PeerConfig::default(), SessionCallbacks::new()).await?;
//! println!("share this: {}", hosted.session_code);
//! // ...receive the answer code out of band, then:
//! // hosted.complete(&answer_code).await?;
//!
//! // Joining side (in another process):
//! // let joined = join_session(&code, "grace", PeerConfig::default(), callbacks).await?;
//! // println!("send this back: {}", joined.answer_code);
//! # Ok(())
//! # }
//! ```
//!
//! The core never touches a UI: the caller feeds input through
//! [`RemoteSessionController`] and renders whatever arrives through
//! [`SessionCallbacks`].

mod controller;
mod error;
#[cfg(feature = "webrtc")]
mod session;
mod state;

pub use controller::RemoteSessionController;
pub use error::{GridlinkError, SessionError};
#[cfg(feature = "webrtc")]
pub use session::{host_session, join_session, HostedSession, JoinedSession};
pub use state::{
    BoardView, ConnectionStatus, DisconnectKind, GamePhase, PlayerRecord, RemoteSession,
    Role, SessionCallbacks,
};

/// One-stop imports for applications.
pub mod prelude {
    pub use crate::{
        BoardView, ConnectionStatus, DisconnectKind, GamePhase, GridlinkError,
        PlayerRecord, RemoteSession, RemoteSessionController, Role, SessionCallbacks,
        SessionError,
    };
    #[cfg(feature = "webrtc")]
    pub use crate::{host_session, join_session, HostedSession, JoinedSession};
    pub use gridlink_peer::{LinkState, MemoryLink, PeerConfig, PeerHandlers, PeerLink};
    pub use gridlink_protocol::{
        Board, DisconnectReason, GameMessage, Mark, SessionId, PROTOCOL_VERSION,
    };
    pub use gridlink_signaling::{
        clear_session_from_url, copy_to_clipboard, decode_session_code,
        encode_session_description, session_from_url, set_session_in_url, SdpKind,
    };
}
