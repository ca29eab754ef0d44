//! View-once detection: an ordered list of signal extractors, first
//! affirmative match wins.
//!
//! Bridge versions disagree on where the "view once" attribute lives, so the
//! predicate is deliberately permissive: any affirmative signal qualifies, and
//! absence of every signal means "not ephemeral".

use crate::transport::InboundMessage;

/// One named ephemerality signal. The name is used only for debug logging.
type SignalExtractor = (&'static str, fn(&InboundMessage) -> bool);

/// Ordered from most to least reliable. The textual heuristic is deprecated
/// and kept only for bridge versions that surface neither structured signal.
const SIGNALS: &[SignalExtractor] = &[
    ("structured", structured_flag),
    ("raw-fallback", raw_fallback),
    ("heuristic", body_heuristic),
];

/// True when any signal says the message is view-once media.
pub fn is_view_once(msg: &InboundMessage) -> bool {
    for (name, extract) in SIGNALS {
        if extract(msg) {
            log::debug!("message {} matched view-once signal: {}", msg.id, name);
            return true;
        }
    }
    false
}

/// The structured attribute set by current bridge versions.
fn structured_flag(msg: &InboundMessage) -> bool {
    msg.view_once == Some(true)
}

/// Wrapper keys the transport nests ephemeral media under, across protocol
/// revisions.
const VIEW_ONCE_KEYS: &[&str] = &[
    "viewOnceMessage",
    "viewOnceMessageV2",
    "viewOnceMessageV2Extension",
];

/// Probe the transport-internal raw data: a view-once wrapper key anywhere at
/// the message level, or a truthy `isViewOnce` field.
fn raw_fallback(msg: &InboundMessage) -> bool {
    let Some(obj) = msg.raw.as_object() else {
        return false;
    };
    if obj
        .get("isViewOnce")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
    {
        return true;
    }
    let message = obj.get("message").and_then(|m| m.as_object());
    let keys: Box<dyn Iterator<Item = &String>> = match message {
        Some(m) => Box::new(m.keys()),
        None => Box::new(obj.keys()),
    };
    for key in keys {
        if VIEW_ONCE_KEYS.contains(&key.as_str()) {
            return true;
        }
    }
    false
}

/// Deprecated, best-effort: keyword match on the body text. Only consulted
/// when both structured signals are absent.
fn body_heuristic(msg: &InboundMessage) -> bool {
    let body = msg.body.to_ascii_lowercase();
    body.contains("view once") || body.contains("view-once")
}
