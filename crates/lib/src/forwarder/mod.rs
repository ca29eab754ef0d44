//! The forwarder pipeline: decide ephemerality, download once, deliver once,
//! and contain every per-message failure.

pub mod detect;

use crate::deliver::Delivery;
use crate::transport::{InboundMessage, MediaKind, MediaPayload, TransportSession};
use std::sync::Arc;

/// Handles inbound messages one at a time. Holds only immutable configuration
/// and shared collaborator handles; no state persists between messages.
pub struct Forwarder {
    session: Arc<dyn TransportSession>,
    delivery: Arc<dyn Delivery>,
}

impl Forwarder {
    pub fn new(session: Arc<dyn TransportSession>, delivery: Arc<dyn Delivery>) -> Self {
        Self { session, delivery }
    }

    /// Process one inbound message: ignore non-ephemeral or non-media
    /// messages, otherwise download the payload once and deliver it.
    ///
    /// Never returns an error and never panics: a failed download or delivery
    /// is logged and the message is dropped, so one bad message cannot affect
    /// the next. There is no retry; a failed forward is permanently lost.
    /// Duplicate events produce duplicate deliveries — nothing is tracked
    /// across messages.
    pub async fn handle_message(&self, msg: InboundMessage) {
        if !msg.has_media {
            return;
        }
        if !detect::is_view_once(&msg) {
            return;
        }
        // Only bare ephemeral images and videos are forwarded; stickers,
        // voice notes, and documents are never touched.
        if !matches!(msg.kind, MediaKind::Image | MediaKind::Video) {
            return;
        }

        let payload = match self.session.download_media(&msg).await {
            Ok(Some(p)) if !p.is_empty() => p,
            Ok(_) => {
                log::warn!(
                    "media for message {} from {} was empty or already expired",
                    msg.id,
                    msg.sender
                );
                return;
            }
            Err(e) => {
                log::warn!("downloading media for message {} failed: {}", msg.id, e);
                return;
            }
        };

        let payload = with_filename(payload);
        let caption = build_caption(&msg.sender);
        match self.delivery.deliver(&payload, &caption).await {
            Ok(receipt) => {
                log::info!(
                    "forwarded view-once {} from {} to {}",
                    payload.mime_type,
                    msg.sender,
                    receipt.target
                );
            }
            Err(e) => {
                log::warn!("delivering message {} from {} failed: {}", msg.id, msg.sender, e);
            }
        }
    }
}

/// Caption for the re-sent media: original sender plus the local processing time.
fn build_caption(sender: &str) -> String {
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("View-once media from {}\nSaved at {}", sender, now)
}

/// Substitute a generated filename when the payload carries none.
fn with_filename(mut payload: MediaPayload) -> MediaPayload {
    if payload.filename.is_none() {
        let ext = extension_for_mime(&payload.mime_type);
        payload.filename = Some(format!("viewonce-{}.{}", uuid::Uuid::new_v4(), ext));
    }
    payload
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/3gpp" => "3gp",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_contains_sender() {
        let caption = build_caption("15551230000@c.us");
        assert!(caption.contains("15551230000@c.us"));
    }

    #[test]
    fn filename_substituted_when_absent() {
        let payload = with_filename(MediaPayload {
            data: vec![1],
            mime_type: "image/jpeg".to_string(),
            filename: None,
        });
        let name = payload.filename.expect("filename set");
        assert!(name.starts_with("viewonce-"));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn filename_kept_when_present() {
        let payload = with_filename(MediaPayload {
            data: vec![1],
            mime_type: "video/mp4".to_string(),
            filename: Some("clip.mp4".to_string()),
        });
        assert_eq!(payload.filename.as_deref(), Some("clip.mp4"));
    }

    #[test]
    fn unknown_mime_falls_back_to_bin() {
        assert_eq!(extension_for_mime("application/x-thing"), "bin");
    }
}
