//! Converting [`GameMessage`] to and from wire frames.
//!
//! The wire format is one newline-free UTF-8 JSON object per data-channel
//! frame. Serialization can only fail on a programmer error (and returns
//! `Result` so callers propagate it); deserialization faces *untrusted*
//! input and therefore returns `Option` — a garbled or adversarial frame
//! becomes `None`, never an error that crosses the component boundary.

use crate::{GameMessage, ProtocolError};

/// Serializes a message into a single JSON text frame.
///
/// # Errors
/// Returns [`ProtocolError::Encode`] if serialization fails. With the
/// current message set this cannot happen in practice, but the seam stays
/// fallible so the wire format can grow without an API break.
pub fn serialize_message(msg: &GameMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(ProtocolError::Encode)
}

/// Deserializes a wire frame back into a message.
///
/// serde's typed deserialization is the structural type guard here: every
/// variant's discriminator, field names, and field types are checked before
/// a value is produced. Unknown `type` tags, missing fields, and wrongly
/// typed fields all yield `None`.
pub fn deserialize_message(frame: &str) -> Option<GameMessage> {
    serde_json::from_str(frame).ok()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DisconnectReason, Mark};

    /// One literal per variant, for the round-trip sweep.
    fn all_variants() -> Vec<GameMessage> {
        vec![
            GameMessage::handshake("ada"),
            GameMessage::move_at(4, Mark::X, 1),
            GameMessage::rematch_request(),
            GameMessage::rematch_response(true, Some(Mark::X)),
            GameMessage::rematch_response(false, None),
            GameMessage::disconnect(DisconnectReason::Left),
            GameMessage::disconnect(DisconnectReason::Error),
            GameMessage::game_reset(),
            GameMessage::player_update("grace", "O"),
        ]
    }

    #[test]
    fn test_round_trip_every_variant() {
        for msg in all_variants() {
            let frame = serialize_message(&msg).expect("serialize");
            let back = deserialize_message(&frame)
                .unwrap_or_else(|| panic!("failed to decode {frame}"));
            assert_eq!(msg, back);
        }
    }

    #[test]
    fn test_frames_contain_no_newlines() {
        // One frame per message; a newline would split a frame in
        // line-delimited consumers.
        for msg in all_variants() {
            let frame = serialize_message(&msg).unwrap();
            assert!(!frame.contains('\n'), "frame has newline: {frame}");
        }
    }

    #[test]
    fn test_deserialize_garbage_returns_none() {
        assert!(deserialize_message("not json at all").is_none());
        assert!(deserialize_message("").is_none());
        assert!(deserialize_message("{}").is_none());
        assert!(deserialize_message("[1,2,3]").is_none());
    }

    #[test]
    fn test_deserialize_unknown_type_returns_none() {
        assert!(deserialize_message(r#"{"type":"teleport"}"#).is_none());
    }

    #[test]
    fn test_deserialize_missing_field_returns_none() {
        // A move without its sequence number is not a move.
        assert!(
            deserialize_message(r#"{"type":"move","cellIndex":4,"player":"X"}"#)
                .is_none()
        );
    }

    #[test]
    fn test_deserialize_wrongly_typed_field_returns_none() {
        assert!(deserialize_message(
            r#"{"type":"move","cellIndex":"four","player":"X","moveNumber":1}"#
        )
        .is_none());
        // Marks are only ever "X" or "O".
        assert!(deserialize_message(
            r#"{"type":"move","cellIndex":4,"player":"Z","moveNumber":1}"#
        )
        .is_none());
    }

    #[test]
    fn test_deserialize_negative_cell_index_returns_none() {
        // cellIndex is unsigned on the wire; a negative number is malformed,
        // not merely out of range.
        assert!(deserialize_message(
            r#"{"type":"move","cellIndex":-1,"player":"X","moveNumber":1}"#
        )
        .is_none());
    }
}
