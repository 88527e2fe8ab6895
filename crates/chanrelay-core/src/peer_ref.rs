//! Free-form channel references typed by an admin: `-1001234567890`, `@name`,
//! `https://t.me/name`, `https://t.me/+token`, `t.me/joinchat/token`.

use std::sync::OnceLock;

use regex::Regex;

static PEER_ID_RE: OnceLock<Regex> = OnceLock::new();
static INVITE_RE: OnceLock<Regex> = OnceLock::new();

const LINK_HOST: &str = "t.me/";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerReference {
    /// Numeric peer id, taken verbatim (the `-100…` channel form included).
    Peer(i64),
    Username(String),
    Invite(String),
}

/// Classify `text`. Total: every input maps to exactly one variant, bare text
/// falling back to a username. Validity is only checked at resolution time.
pub fn parse_peer_reference(text: &str) -> PeerReference {
    let t = text.trim();

    let peer_re = PEER_ID_RE.get_or_init(|| Regex::new(r"^-?\d{5,}$").expect("valid regex"));
    if peer_re.is_match(t) {
        // Out-of-range digit strings fall through to the username fallback.
        if let Ok(id) = t.parse::<i64>() {
            return PeerReference::Peer(id);
        }
    }

    if let Some(name) = t.strip_prefix('@') {
        return PeerReference::Username(name.to_string());
    }

    let invite_re = INVITE_RE.get_or_init(|| {
        Regex::new(r"(?:^|/)(?:joinchat/|\+)([A-Za-z0-9_-]+)").expect("valid regex")
    });
    if let Some(token) = invite_re.captures(t).and_then(|c| c.get(1)) {
        return PeerReference::Invite(token.as_str().to_string());
    }

    if let Some((_, path)) = t.split_once(LINK_HOST) {
        let name = path
            .split('/')
            .next()
            .unwrap_or("")
            .split('?')
            .next()
            .unwrap_or("")
            .trim_start_matches('@');
        return PeerReference::Username(name.to_string());
    }

    PeerReference::Username(t.to_string())
}
