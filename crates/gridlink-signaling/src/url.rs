//! Join-by-URL helpers.
//!
//! A session code may optionally travel in a page URL fragment as
//! `#join=<code>`, so a host can send one link instead of a code plus
//! instructions. These are pure string operations over caller-supplied URLs:
//! the frontend reads its own location, passes it through here, and applies
//! whatever comes back. Nothing here touches the network or the session
//! itself.

/// The fragment prefix marking an embedded session code.
pub const JOIN_FRAGMENT_PREFIX: &str = "#join=";

/// Extracts a session code from a URL's `#join=` fragment.
///
/// Returns `None` when there is no fragment, the fragment has a different
/// shape, or the embedded code is empty. The code itself is *not* validated
/// here — that is [`decode_session_code`](crate::decode_session_code)'s job.
pub fn session_from_url(url: &str) -> Option<String> {
    let (_, fragment) = url.split_once('#')?;
    let code = fragment.strip_prefix(&JOIN_FRAGMENT_PREFIX[1..])?;
    if code.is_empty() {
        return None;
    }
    Some(code.to_string())
}

/// Returns `url` with its fragment replaced by `#join=<code>`.
pub fn set_session_in_url(url: &str, code: &str) -> String {
    let base = url.split_once('#').map_or(url, |(base, _)| base);
    format!("{base}{JOIN_FRAGMENT_PREFIX}{code}")
}

/// Returns `url` with any `#join=` fragment removed. Other fragments are
/// left alone.
pub fn clear_session_from_url(url: &str) -> String {
    match url.split_once('#') {
        Some((base, fragment)) if fragment.starts_with(&JOIN_FRAGMENT_PREFIX[1..]) => {
            base.to_string()
        }
        _ => url.to_string(),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_url_extracts_code() {
        assert_eq!(
            session_from_url("https://example.com/play#join=A2B3C4:QUJD"),
            Some("A2B3C4:QUJD".to_string())
        );
    }

    #[test]
    fn test_session_from_url_handles_bare_fragment() {
        // Callers may pass just `location.hash`.
        assert_eq!(
            session_from_url("#join=A2B3C4:QUJD"),
            Some("A2B3C4:QUJD".to_string())
        );
    }

    #[test]
    fn test_session_from_url_rejects_other_fragments() {
        assert_eq!(session_from_url("https://example.com/#about"), None);
        assert_eq!(session_from_url("https://example.com/"), None);
        assert_eq!(session_from_url("https://example.com/#join="), None);
    }

    #[test]
    fn test_set_session_in_url_appends_fragment() {
        assert_eq!(
            set_session_in_url("https://example.com/play", "C0DE"),
            "https://example.com/play#join=C0DE"
        );
    }

    #[test]
    fn test_set_session_in_url_replaces_existing_fragment() {
        assert_eq!(
            set_session_in_url("https://example.com/play#join=OLD", "NEW"),
            "https://example.com/play#join=NEW"
        );
        assert_eq!(
            set_session_in_url("https://example.com/play#about", "NEW"),
            "https://example.com/play#join=NEW"
        );
    }

    #[test]
    fn test_clear_session_removes_join_fragment_only() {
        assert_eq!(
            clear_session_from_url("https://example.com/play#join=C0DE"),
            "https://example.com/play"
        );
        // Unrelated fragments survive.
        assert_eq!(
            clear_session_from_url("https://example.com/play#about"),
            "https://example.com/play#about"
        );
        assert_eq!(
            clear_session_from_url("https://example.com/play"),
            "https://example.com/play"
        );
    }

    #[test]
    fn test_set_then_get_then_clear_round_trip() {
        let url = set_session_in_url("https://example.com/", "A2B3C4:QUJD");
        assert_eq!(session_from_url(&url), Some("A2B3C4:QUJD".to_string()));
        assert_eq!(clear_session_from_url(&url), "https://example.com/");
    }
}
