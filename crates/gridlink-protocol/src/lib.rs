//! Wire protocol for Gridlink.
//!
//! This crate defines the "language" that two peers speak over their data
//! channel:
//!
//! - **Types** ([`GameMessage`], [`Mark`], [`SessionId`]) — the message
//!   structures that travel on the wire, and the identifiers that label a
//!   session.
//! - **Codec** ([`serialize_message`], [`deserialize_message`]) — how those
//!   messages are converted to/from JSON text frames.
//! - **Validation** ([`validate_move`]) — the sequencing and turn-order
//!   checks that protect a peer from a desynchronized or malicious remote.
//! - **Errors** ([`ProtocolError`], [`MoveRejection`]).
//!
//! # Architecture
//!
//! The protocol layer is the leaf of the stack. It knows nothing about
//! connections, signaling, or sessions — only message shapes and the rules
//! for judging an incoming move.
//!
//! ```text
//! Peer link (frames) → Protocol (GameMessage) → Session controller
//! ```
//!
//! # Trust model
//!
//! Everything arriving over the wire is untrusted. [`deserialize_message`]
//! runs serde's structural checks over every variant and returns `None` for
//! anything malformed — it never panics and never propagates a parse error
//! across the crate boundary. [`validate_move`] applies the game-level checks
//! on top of that.

mod codec;
mod error;
mod types;
mod validate;

pub use codec::{deserialize_message, serialize_message};
pub use error::ProtocolError;
pub use types::{
    DisconnectReason, GameMessage, Mark, SessionId, PROTOCOL_VERSION,
    SESSION_ID_ALPHABET, SESSION_ID_LEN,
};
pub use validate::{validate_move, Board, MoveRejection, BOARD_CELLS};
