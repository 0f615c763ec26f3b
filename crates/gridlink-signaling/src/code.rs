//! The session-code format: `"<id>:<base64(JSON{type, sdp})>"`.
//!
//! The id prefix stays outside the base64 payload on purpose — it lets a
//! human eyeball which session a pasted code belongs to without decoding
//! anything.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use gridlink_protocol::SessionId;

/// Which half of the negotiation a description is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    /// Created by the host; the first half of the exchange.
    Offer,
    /// Created by the guest in response to an offer.
    Answer,
}

impl std::fmt::Display for SdpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SdpKind::Offer => f.write_str("offer"),
            SdpKind::Answer => f.write_str("answer"),
        }
    }
}

/// A decoded session code: the id label plus the raw description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSession {
    /// The six-character session label. Carries no authority.
    pub id: SessionId,
    /// Offer or answer.
    pub kind: SdpKind,
    /// The raw SDP text, exactly as the peer layer produced it.
    pub sdp: String,
}

/// The JSON object inside the base64 payload.
///
/// Kept private: the outside world only sees the flat code string and
/// [`EncodedSession`].
#[derive(Serialize, Deserialize)]
struct SessionPayload {
    #[serde(rename = "type")]
    kind: SdpKind,
    sdp: String,
}

/// Wraps a session description into a copy-pasteable code.
pub fn encode_session_description(kind: SdpKind, sdp: &str, id: &SessionId) -> String {
    let payload = SessionPayload {
        kind,
        sdp: sdp.to_string(),
    };
    // Serializing two plain string fields cannot fail.
    let json = serde_json::to_string(&payload).expect("payload is plain strings");
    format!("{id}:{}", STANDARD.encode(json))
}

/// Decodes a pasted session code.
///
/// Returns `None` — never an error, never a panic — when any layer of the
/// format is wrong:
///
/// - no `:` separator,
/// - id not exactly six characters from the session-id alphabet,
/// - payload not valid base64,
/// - base64 content not valid UTF-8 JSON,
/// - JSON missing `type`/`sdp`, or holding the wrong types,
/// - `type` not `"offer"` or `"answer"`.
pub fn decode_session_code(code: &str) -> Option<EncodedSession> {
    let (id_part, payload_part) = code.split_once(':')?;
    let id = SessionId::parse(id_part)?;
    let bytes = STANDARD.decode(payload_part).ok()?;
    let json = String::from_utf8(bytes).ok()?;
    let payload: SessionPayload = serde_json::from_str(&json).ok()?;
    Some(EncodedSession {
        id,
        kind: payload.kind,
        sdp: payload.sdp,
    })
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId::parse(s).expect("valid test id")
    }

    const FAKE_SDP: &str = "v=0\r\no=- 4611731400430051336 2 IN IP4 127.0.0.1\r\ns=-\r\n";

    #[test]
    fn test_encode_has_id_prefix_and_separator() {
        let code = encode_session_description(SdpKind::Offer, FAKE_SDP, &sid("A2B3C4"));
        assert!(code.starts_with("A2B3C4:"));
        // Exactly one separator between id and payload; base64 never
        // contains ':'.
        assert_eq!(code.matches(':').count(), 1);
    }

    #[test]
    fn test_decode_inverts_encode_for_both_kinds() {
        for kind in [SdpKind::Offer, SdpKind::Answer] {
            let code = encode_session_description(kind, FAKE_SDP, &sid("XYZ234"));
            let decoded = decode_session_code(&code).expect("decodes");
            assert_eq!(decoded.id, sid("XYZ234"));
            assert_eq!(decoded.kind, kind);
            assert_eq!(decoded.sdp, FAKE_SDP);
        }
    }

    #[test]
    fn test_decode_payload_is_tagged_json() {
        // Pin the inner wire shape, not just the round trip.
        let code = encode_session_description(SdpKind::Answer, "sdp-text", &sid("A2B3C4"));
        let payload = code.split_once(':').unwrap().1;
        let json: serde_json::Value =
            serde_json::from_slice(&STANDARD.decode(payload).unwrap()).unwrap();
        assert_eq!(json["type"], "answer");
        assert_eq!(json["sdp"], "sdp-text");
    }

    #[test]
    fn test_decode_rejects_missing_separator() {
        assert!(decode_session_code("A2B3C4").is_none());
        assert!(decode_session_code("").is_none());
    }

    #[test]
    fn test_decode_rejects_bad_id() {
        let payload = {
            let code = encode_session_description(SdpKind::Offer, FAKE_SDP, &sid("A2B3C4"));
            code.split_once(':').unwrap().1.to_string()
        };
        // Wrong length.
        assert!(decode_session_code(&format!("A2B3C:{payload}")).is_none());
        assert!(decode_session_code(&format!("A2B3C4D:{payload}")).is_none());
        // Ambiguous characters are not in the alphabet.
        assert!(decode_session_code(&format!("A2B3C0:{payload}")).is_none());
        // Lowercase.
        assert!(decode_session_code(&format!("a2b3c4:{payload}")).is_none());
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        assert!(decode_session_code("A2B3C4:!!!not-base64!!!").is_none());
    }

    #[test]
    fn test_decode_rejects_non_json_payload() {
        let not_json = STANDARD.encode("hello there");
        assert!(decode_session_code(&format!("A2B3C4:{not_json}")).is_none());
    }

    #[test]
    fn test_decode_rejects_missing_or_mistyped_fields() {
        for bad in [
            r#"{"sdp":"x"}"#,                       // no type
            r#"{"type":"offer"}"#,                  // no sdp
            r#"{"type":"offer","sdp":42}"#,         // sdp wrong type
            r#"{"type":"renegotiate","sdp":"x"}"#,  // unknown kind
            r#"{"type":42,"sdp":"x"}"#,             // type wrong type
        ] {
            let payload = STANDARD.encode(bad);
            assert!(
                decode_session_code(&format!("A2B3C4:{payload}")).is_none(),
                "should reject payload {bad}"
            );
        }
    }

    #[test]
    fn test_decode_never_panics_on_fuzzy_input() {
        // A smoke sweep over pathological strings; the property is simply
        // "returns, and returns None".
        for s in [
            ":",
            "::",
            "A2B3C4:",
            ":AAAA",
            "A2B3C4::extra",
            "\u{0}\u{0}\u{0}",
            "🦀🦀🦀🦀🦀🦀:🦀",
        ] {
            assert!(decode_session_code(s).is_none(), "accepted {s:?}");
        }
    }
}
