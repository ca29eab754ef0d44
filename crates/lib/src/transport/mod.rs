//! Messaging-session transport: events, message types, and the bridge connector.
//!
//! The session itself (QR pairing, credential persistence, reconnects) lives in
//! an external bridge process; this module consumes it as an event source and
//! exposes its download/send primitives behind a trait so the forwarder can be
//! tested without a live session.

mod bridge;
mod message;

pub use bridge::BridgeSession;
pub use message::{InboundMessage, MediaKind, MediaPayload};

use async_trait::async_trait;

/// Lifecycle and message events surfaced by the messaging session.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Pairing QR code payload; the operator scans it with the phone.
    QrCode(String),
    /// Session authenticated and ready to receive messages.
    Ready,
    /// Authentication failed; recovery is the bridge's responsibility.
    AuthFailure(String),
    /// Connection dropped.
    Disconnected(String),
    Message(InboundMessage),
}

/// Handle to the authenticated messaging session (download, send, stop).
#[async_trait]
pub trait TransportSession: Send + Sync {
    /// Session id (e.g. "bridge").
    fn id(&self) -> &str;

    /// Stop the connector loop.
    fn stop(&self);

    /// Download the media attachment of a message. `Ok(None)` means the media
    /// was already gone when the download ran — a real race for view-once
    /// media, which the sender side deletes after first view.
    async fn download_media(&self, msg: &InboundMessage) -> Result<Option<MediaPayload>, String>;

    /// Send a media payload with a caption to a destination JID.
    async fn send_media(
        &self,
        destination: &str,
        payload: &MediaPayload,
        caption: &str,
    ) -> Result<(), String>;
}
