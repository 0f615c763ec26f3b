//! Core protocol types for Gridlink's wire format.
//!
//! Every type here is either serialized onto the data channel or embedded in
//! a session code, so the serde attributes are load-bearing: they pin the
//! exact JSON shape both peers must agree on. The unit tests at the bottom
//! verify those shapes byte for byte.

use serde::{Deserialize, Serialize};

use std::fmt;

use rand::Rng;

/// The protocol version sent in every handshake. Peers with a different
/// version cannot play together; the mismatch is surfaced as a fatal error,
/// never negotiated down.
pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Session identifiers
// ---------------------------------------------------------------------------

/// The alphabet session ids are drawn from: digits 2–9 and uppercase letters,
/// minus everything easily misread over a voice call or chat paste
/// (0/O, 1/I/L). 31 characters total.
pub const SESSION_ID_ALPHABET: &str = "23456789ABCDEFGHJKMNPQRSTUVWXYZ";

/// Session ids are always exactly this long.
pub const SESSION_ID_LEN: usize = 6;

/// A human-shareable label for one session.
///
/// Six characters from [`SESSION_ID_ALPHABET`]. The id carries no authority —
/// it exists so two people can tell session codes apart when pasting them
/// around. Collisions across sessions are accepted: codes are ephemeral and
/// exchanged out of band.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Draws six independent uniform samples from the alphabet.
    ///
    /// No uniqueness guarantee — see the type-level docs.
    pub fn generate() -> Self {
        let alphabet = SESSION_ID_ALPHABET.as_bytes();
        let mut rng = rand::rng();
        let id = (0..SESSION_ID_LEN)
            .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
            .collect();
        Self(id)
    }

    /// Validates a candidate id: exactly six characters, all from the
    /// alphabet. Returns `None` for anything else — wrong length, lowercase,
    /// ambiguous characters, separators, whatever.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != SESSION_ID_LEN {
            return None;
        }
        if !s.chars().all(|c| SESSION_ID_ALPHABET.contains(c)) {
            return None;
        }
        Some(Self(s.to_string()))
    }

    /// The raw six-character code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Marks
// ---------------------------------------------------------------------------

/// A player's mark on the grid. `X` always moves first.
///
/// This is the *game* identity of a player, distinct from the cosmetic
/// display symbol carried by [`GameMessage::PlayerUpdate`] — the mark drives
/// turn order and move validation, the display symbol is just what the UI
/// renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The other mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// The mark that opens a game.
    pub fn first() -> Self {
        Mark::X
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => f.write_str("X"),
            Mark::O => f.write_str("O"),
        }
    }
}

// ---------------------------------------------------------------------------
// GameMessage — the closed wire variant set
// ---------------------------------------------------------------------------

/// Why a peer is going away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisconnectReason {
    /// The player chose to leave.
    Left,
    /// The peer hit an unrecoverable error and is bailing out.
    Error,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::Left => f.write_str("left"),
            DisconnectReason::Error => f.write_str("error"),
        }
    }
}

/// A message exchanged over the data channel.
///
/// This is a closed set: anything with an unknown `type` tag fails
/// deserialization, which is how unrecognized (or adversarial) payloads get
/// rejected before they reach the session controller.
///
/// The serde attributes pin the wire shape: an externally visible `type`
/// discriminator in kebab-case, camelCase field names, one JSON object per
/// frame. For example:
///
/// ```json
/// { "type": "move", "cellIndex": 4, "player": "X", "moveNumber": 1 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum GameMessage {
    /// Sent once by each side when the channel opens.
    Handshake {
        player_name: String,
        protocol_version: u32,
    },

    /// One move. `move_number` counts accepted moves from 1 and must advance
    /// by exactly one per move — the receiver checks this against its own
    /// counter to catch desynchronization.
    Move {
        cell_index: u8,
        player: Mark,
        move_number: u32,
    },

    /// "Play again?"
    RematchRequest,

    /// Answer to a rematch request. `starting_player` lets the responder pick
    /// who opens the new game; absent means the first-moving mark.
    RematchResponse {
        accepted: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        starting_player: Option<Mark>,
    },

    /// Graceful goodbye. A channel that closes *without* one of these is an
    /// ungraceful disconnect.
    Disconnect { reason: DisconnectReason },

    /// Full reset of the current game, outside rematch negotiation.
    GameReset,

    /// Cosmetic update: the sender's display name and symbol changed.
    PlayerUpdate { name: String, symbol: String },
}

/// Constructors producing well-formed message literals.
///
/// These exist to keep the wire shape in one place instead of scattering
/// struct literals across every call site.
impl GameMessage {
    pub fn handshake(player_name: impl Into<String>) -> Self {
        Self::Handshake {
            player_name: player_name.into(),
            protocol_version: PROTOCOL_VERSION,
        }
    }

    pub fn move_at(cell_index: u8, player: Mark, move_number: u32) -> Self {
        Self::Move {
            cell_index,
            player,
            move_number,
        }
    }

    pub fn rematch_request() -> Self {
        Self::RematchRequest
    }

    pub fn rematch_response(accepted: bool, starting_player: Option<Mark>) -> Self {
        Self::RematchResponse {
            accepted,
            starting_player,
        }
    }

    pub fn disconnect(reason: DisconnectReason) -> Self {
        Self::Disconnect { reason }
    }

    pub fn game_reset() -> Self {
        Self::GameReset
    }

    pub fn player_update(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::PlayerUpdate {
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is an agreement between two independent peers, so
    //! these tests verify exact JSON shapes, not just round-trips: a serde
    //! attribute typo would round-trip fine and still break cross-version
    //! compatibility.

    use super::*;

    // =====================================================================
    // SessionId
    // =====================================================================

    #[test]
    fn test_generate_returns_six_chars_from_alphabet() {
        for _ in 0..100 {
            let id = SessionId::generate();
            assert_eq!(id.as_str().len(), SESSION_ID_LEN);
            assert!(
                id.as_str().chars().all(|c| SESSION_ID_ALPHABET.contains(c)),
                "unexpected character in {id}"
            );
        }
    }

    #[test]
    fn test_alphabet_has_31_unambiguous_chars() {
        assert_eq!(SESSION_ID_ALPHABET.len(), 31);
        for bad in ['0', 'O', '1', 'I', 'L'] {
            assert!(
                !SESSION_ID_ALPHABET.contains(bad),
                "ambiguous char {bad} in alphabet"
            );
        }
    }

    #[test]
    fn test_parse_accepts_valid_id() {
        let id = SessionId::parse("A2B3C4").expect("valid id");
        assert_eq!(id.as_str(), "A2B3C4");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(SessionId::parse("A2B3C").is_none());
        assert!(SessionId::parse("A2B3C4D").is_none());
        assert!(SessionId::parse("").is_none());
    }

    #[test]
    fn test_parse_rejects_chars_outside_alphabet() {
        assert!(SessionId::parse("A2B3C0").is_none()); // 0 is ambiguous
        assert!(SessionId::parse("A2B3CO").is_none()); // O is ambiguous
        assert!(SessionId::parse("a2b3c4").is_none()); // lowercase
        assert!(SessionId::parse("A2B3C!").is_none());
    }

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let id = SessionId::parse("XYZ234").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"XYZ234\"");
    }

    // =====================================================================
    // Mark
    // =====================================================================

    #[test]
    fn test_mark_opponent_flips() {
        assert_eq!(Mark::X.opponent(), Mark::O);
        assert_eq!(Mark::O.opponent(), Mark::X);
    }

    #[test]
    fn test_mark_first_is_x() {
        assert_eq!(Mark::first(), Mark::X);
    }

    #[test]
    fn test_mark_serializes_as_bare_letter() {
        assert_eq!(serde_json::to_string(&Mark::X).unwrap(), "\"X\"");
        assert_eq!(serde_json::to_string(&Mark::O).unwrap(), "\"O\"");
    }

    // =====================================================================
    // GameMessage — one shape test per variant
    // =====================================================================

    #[test]
    fn test_handshake_json_format() {
        let msg = GameMessage::handshake("ada");
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "handshake");
        assert_eq!(json["playerName"], "ada");
        assert_eq!(json["protocolVersion"], PROTOCOL_VERSION);
    }

    #[test]
    fn test_move_json_format() {
        let msg = GameMessage::move_at(4, Mark::X, 1);
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "move");
        assert_eq!(json["cellIndex"], 4);
        assert_eq!(json["player"], "X");
        assert_eq!(json["moveNumber"], 1);
    }

    #[test]
    fn test_rematch_request_json_format() {
        let json: serde_json::Value =
            serde_json::to_value(GameMessage::rematch_request()).unwrap();
        assert_eq!(json["type"], "rematch-request");
    }

    #[test]
    fn test_rematch_response_json_format() {
        let msg = GameMessage::rematch_response(true, Some(Mark::O));
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "rematch-response");
        assert_eq!(json["accepted"], true);
        assert_eq!(json["startingPlayer"], "O");
    }

    #[test]
    fn test_rematch_response_omits_absent_starting_player() {
        let msg = GameMessage::rematch_response(false, None);
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["accepted"], false);
        assert!(
            json.get("startingPlayer").is_none(),
            "absent startingPlayer must not be serialized as null"
        );
    }

    #[test]
    fn test_disconnect_json_format() {
        let msg = GameMessage::disconnect(DisconnectReason::Left);
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "disconnect");
        assert_eq!(json["reason"], "left");
    }

    #[test]
    fn test_game_reset_json_format() {
        let json: serde_json::Value =
            serde_json::to_value(GameMessage::game_reset()).unwrap();
        assert_eq!(json["type"], "game-reset");
    }

    #[test]
    fn test_player_update_json_format() {
        let msg = GameMessage::player_update("grace", "♛");
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "player-update");
        assert_eq!(json["name"], "grace");
        assert_eq!(json["symbol"], "♛");
    }

    #[test]
    fn test_rematch_response_deserializes_without_starting_player() {
        // `startingPlayer` is optional on the wire.
        let msg: GameMessage =
            serde_json::from_str(r#"{"type":"rematch-response","accepted":true}"#)
                .unwrap();
        assert_eq!(msg, GameMessage::rematch_response(true, None));
    }

    #[test]
    fn test_unknown_type_tag_fails_to_deserialize() {
        let result: Result<GameMessage, _> =
            serde_json::from_str(r#"{"type":"fly-to-moon","speed":9000}"#);
        assert!(result.is_err());
    }
}
