//! Bridge session: long-poll /events and call /media + /send on a local
//! WhatsApp bridge sidecar's HTTP API.

use crate::transport::{InboundMessage, MediaKind, MediaPayload, TransportEvent, TransportSession};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const LONG_POLL_TIMEOUT: u64 = 25;

#[derive(Debug, Deserialize)]
struct EventsResponse {
    ok: bool,
    #[serde(default)]
    events: Vec<BridgeEvent>,
    cursor: Option<i64>,
}

/// Bridge event payload (one item of the /events long-poll result).
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    Qr {
        code: String,
    },
    Ready,
    AuthFailure {
        #[serde(default)]
        reason: String,
    },
    Disconnected {
        #[serde(default)]
        reason: String,
    },
    Message {
        message: BridgeMessage,
    },
}

/// Message shape on the bridge wire. `raw` carries the transport-internal
/// message data verbatim for fallback view-once detection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeMessage {
    pub id: String,
    pub from: String,
    #[serde(default)]
    pub has_media: bool,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub view_once: Option<bool>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl BridgeMessage {
    pub fn into_inbound(self) -> InboundMessage {
        let kind = self
            .mimetype
            .as_deref()
            .map(MediaKind::from_mime)
            .unwrap_or(MediaKind::Other);
        InboundMessage {
            id: self.id,
            sender: self.from,
            has_media: self.has_media,
            kind,
            view_once: self.view_once,
            body: self.body,
            raw: self.raw,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    ok: bool,
    #[serde(default)]
    data: String,
    #[serde(default)]
    mimetype: Option<String>,
    #[serde(default)]
    filename: Option<String>,
}

/// Connector to the bridge sidecar: long-polls /events and exposes the
/// session's download/send primitives.
pub struct BridgeSession {
    id: String,
    base_url: String,
    api_token: Option<String>,
    running: AtomicBool,
    client: reqwest::Client,
}

impl BridgeSession {
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            id: "bridge".to_string(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
            running: AtomicBool::new(false),
            client: reqwest::Client::new(),
        }
    }

    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn authorize(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(t) => rb.bearer_auth(t),
            None => rb,
        }
    }

    /// Start the /events long-poll loop and forward events to the server.
    /// Returns a handle to await on shutdown.
    pub fn start_inbound(self: Arc<Self>, event_tx: mpsc::Sender<TransportEvent>) -> JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        log::info!("bridge session: starting /events long-poll loop");
        tokio::spawn(async move {
            run_events_loop(self, event_tx).await;
        })
    }

    /// Call the bridge /events endpoint (long poll). Returns (events, next_cursor).
    async fn get_events(&self, cursor: Option<i64>) -> Result<(Vec<BridgeEvent>, Option<i64>), String> {
        let url = format!(
            "{}/events?timeout={}",
            self.base_url, LONG_POLL_TIMEOUT
        );
        let url = if let Some(c) = cursor {
            format!("{}&cursor={}", url, c)
        } else {
            url
        };
        let res = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("events poll failed: {} {}", status, body));
        }
        let data: EventsResponse = res.json().await.map_err(|e| e.to_string())?;
        if !data.ok {
            return Err("events poll returned ok: false".to_string());
        }
        Ok((data.events, data.cursor))
    }
}

async fn run_events_loop(session: Arc<BridgeSession>, event_tx: mpsc::Sender<TransportEvent>) {
    let mut cursor: Option<i64> = None;
    while session.running() {
        match session.get_events(cursor).await {
            Ok((events, next)) => {
                // An empty poll may omit the cursor; keep the last one.
                if next.is_some() {
                    cursor = next;
                }
                for ev in events {
                    let out = match ev {
                        BridgeEvent::Qr { code } => TransportEvent::QrCode(code),
                        BridgeEvent::Ready => TransportEvent::Ready,
                        BridgeEvent::AuthFailure { reason } => TransportEvent::AuthFailure(reason),
                        BridgeEvent::Disconnected { reason } => TransportEvent::Disconnected(reason),
                        BridgeEvent::Message { message } => {
                            TransportEvent::Message(message.into_inbound())
                        }
                    };
                    if event_tx.send(out).await.is_err() {
                        log::debug!("bridge: event channel closed, stopping loop");
                        return;
                    }
                }
            }
            Err(e) => {
                log::debug!("bridge events poll error: {}", e);
                tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
            }
        }
    }
    log::info!("bridge session: /events loop stopped");
}

#[async_trait]
impl TransportSession for BridgeSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// GET /media/{id} — fetch the attachment bytes. 404 or an empty data
    /// field mean the media expired before the download completed.
    async fn download_media(&self, msg: &InboundMessage) -> Result<Option<MediaPayload>, String> {
        let url = format!("{}/media/{}", self.base_url, msg.id);
        let res = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if res.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("media download failed: {} {}", status, body));
        }
        let data: MediaResponse = res.json().await.map_err(|e| e.to_string())?;
        if !data.ok || data.data.is_empty() {
            return Ok(None);
        }
        let bytes = base64::Engine::decode(
            &base64::engine::general_purpose::STANDARD,
            data.data.as_bytes(),
        )
        .map_err(|e| format!("invalid media encoding: {}", e))?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(MediaPayload {
            data: bytes,
            mime_type: data.mimetype.unwrap_or_else(|| "application/octet-stream".to_string()),
            filename: data.filename,
        }))
    }

    /// POST /send — re-transmit a payload to a destination JID with a caption.
    async fn send_media(
        &self,
        destination: &str,
        payload: &MediaPayload,
        caption: &str,
    ) -> Result<(), String> {
        let url = format!("{}/send", self.base_url);
        let data = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            &payload.data,
        );
        let body = serde_json::json!({
            "to": destination,
            "data": data,
            "mimetype": payload.mime_type,
            "filename": payload.filename,
            "caption": caption,
        });
        let res = self
            .authorize(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("send failed: {} {}", status, body));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_response_parses_all_event_kinds() {
        let json = r#"{
            "ok": true,
            "cursor": 42,
            "events": [
                {"type": "qr", "code": "2@abc"},
                {"type": "ready"},
                {"type": "auth_failure", "reason": "logged out"},
                {"type": "disconnected", "reason": "timed out"},
                {"type": "message", "message": {
                    "id": "ABCD1234",
                    "from": "15551230000@c.us",
                    "hasMedia": true,
                    "mimetype": "image/jpeg",
                    "viewOnce": true,
                    "body": "",
                    "raw": {"isViewOnce": true}
                }}
            ]
        }"#;
        let res: EventsResponse = serde_json::from_str(json).expect("parse events");
        assert!(res.ok);
        assert_eq!(res.cursor, Some(42));
        assert_eq!(res.events.len(), 5);
        let BridgeEvent::Message { message } = &res.events[4] else {
            panic!("expected message event");
        };
        assert!(message.has_media);
        assert_eq!(message.view_once, Some(true));
    }

    #[test]
    fn bridge_message_maps_to_inbound() {
        let json = r#"{
            "id": "ABCD1234",
            "from": "15551230000@c.us",
            "hasMedia": true,
            "mimetype": "video/mp4",
            "body": "caption"
        }"#;
        let msg: BridgeMessage = serde_json::from_str(json).expect("parse message");
        let inbound = msg.into_inbound();
        assert_eq!(inbound.kind, MediaKind::Video);
        assert_eq!(inbound.sender, "15551230000@c.us");
        assert_eq!(inbound.view_once, None);
        assert!(inbound.raw.is_null());
    }

    #[test]
    fn media_response_without_data_is_empty() {
        let json = r#"{"ok": true, "data": "", "mimetype": "image/jpeg"}"#;
        let res: MediaResponse = serde_json::from_str(json).expect("parse media");
        assert!(res.ok);
        assert!(res.data.is_empty());
        assert_eq!(res.filename, None);
    }
}
