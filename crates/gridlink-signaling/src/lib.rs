//! Manual signaling for Gridlink.
//!
//! There is no signaling server. Before a data channel can open, the two
//! sides have to exchange session descriptions (an offer and an answer) over
//! *any* out-of-band channel — a chat message, an email, a shouted string of
//! characters. This crate turns descriptions into something a human can
//! paste around:
//!
//! - [`encode_session_description`] / [`decode_session_code`] — the
//!   `"<id>:<base64 json>"` session-code format.
//! - [`session_from_url`] and friends — optional `#join=<code>` deep links,
//!   as pure string operations so any frontend can apply them to whatever
//!   URL it owns.
//! - [`copy_to_clipboard`] — convenience wrapper; failure is non-fatal by
//!   contract since manual selection always remains possible.
//!
//! Decoding is strict and silent: a session code is untrusted input, so
//! every malformed shape yields `None` instead of an error or panic.

mod clipboard;
mod code;
mod error;
mod url;

pub use clipboard::copy_to_clipboard;
pub use code::{decode_session_code, encode_session_description, EncodedSession, SdpKind};
pub use error::SignalError;
pub use url::{clear_session_from_url, session_from_url, set_session_in_url, JOIN_FRAGMENT_PREFIX};
