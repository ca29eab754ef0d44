//! Inbound message and media payload types from the messaging session.

/// Coarse media classification. Only images and videos are ever forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    /// Stickers, voice notes, documents, or no media at all.
    Other,
}

impl MediaKind {
    /// Classify from a MIME type string (e.g. "image/jpeg" -> Image).
    pub fn from_mime(mime: &str) -> Self {
        let m = mime.trim().to_ascii_lowercase();
        if m.starts_with("image/") {
            MediaKind::Image
        } else if m.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }
}

/// One inbound message event from the bridge. Read-only; dropped after handling.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Raw transport identifier of the message.
    pub id: String,
    /// Sender identifier (phone-number-like JID).
    pub sender: String,
    /// Whether the message carries a media attachment.
    pub has_media: bool,
    pub kind: MediaKind,
    /// Structured "view once" attribute. Absent on older bridge versions;
    /// detection falls back to probing `raw`.
    pub view_once: Option<bool>,
    /// Caption or body text.
    pub body: String,
    /// Transport-internal raw message data, kept verbatim for fallback
    /// ephemerality signals.
    pub raw: serde_json::Value,
}

/// Downloaded media content. Owned by a single forward operation; at most one
/// payload is ever materialized per message (no caching, no re-download).
#[derive(Debug, Clone)]
pub struct MediaPayload {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub filename: Option<String>,
}

impl MediaPayload {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("image/jpeg"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("IMAGE/PNG"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("audio/ogg"), MediaKind::Other);
        assert_eq!(MediaKind::from_mime(""), MediaKind::Other);
    }
}
