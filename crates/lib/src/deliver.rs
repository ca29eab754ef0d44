//! Delivery collaborators: forward to a fixed contact, or upload to cloud
//! storage and log the shareable link.

use crate::transport::{MediaPayload, TransportSession};
use async_trait::async_trait;
use std::sync::Arc;

/// Where the payload ended up: a destination JID, or a shareable link. Used
/// only for the success log line.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub target: String,
}

/// One-shot delivery of a downloaded payload. Implementations must not retry.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Delivery id (e.g. "contact").
    fn id(&self) -> &str;

    async fn deliver(
        &self,
        payload: &MediaPayload,
        caption: &str,
    ) -> Result<DeliveryReceipt, String>;
}

/// Forward to a single fixed contact via the transport's send primitive.
pub struct ContactDelivery {
    session: Arc<dyn TransportSession>,
    destination: String,
}

impl ContactDelivery {
    pub fn new(session: Arc<dyn TransportSession>, destination: impl Into<String>) -> Self {
        Self {
            session,
            destination: destination.into(),
        }
    }
}

#[async_trait]
impl Delivery for ContactDelivery {
    fn id(&self) -> &str {
        "contact"
    }

    async fn deliver(
        &self,
        payload: &MediaPayload,
        caption: &str,
    ) -> Result<DeliveryReceipt, String> {
        self.session
            .send_media(&self.destination, payload, caption)
            .await?;
        Ok(DeliveryReceipt {
            target: self.destination.clone(),
        })
    }
}

/// Upload to cloud storage, make the file publicly viewable, and return the
/// shareable link as the receipt. The link is logged, never sent back out.
#[cfg(feature = "drive")]
pub struct DriveDelivery {
    client: drive_delivery::DriveClient,
    default_filename: String,
}

#[cfg(feature = "drive")]
impl DriveDelivery {
    pub fn new(client: drive_delivery::DriveClient) -> Self {
        Self {
            client,
            default_filename: "viewonce".to_string(),
        }
    }
}

#[cfg(feature = "drive")]
#[async_trait]
impl Delivery for DriveDelivery {
    fn id(&self) -> &str {
        "drive"
    }

    async fn deliver(
        &self,
        payload: &MediaPayload,
        _caption: &str,
    ) -> Result<DeliveryReceipt, String> {
        let filename = payload
            .filename
            .as_deref()
            .unwrap_or(&self.default_filename);
        let uploaded = self
            .client
            .upload(&payload.data, &payload.mime_type, filename)
            .await
            .map_err(|e| e.to_string())?;
        self.client
            .share_public(&uploaded.id)
            .await
            .map_err(|e| e.to_string())?;
        Ok(DeliveryReceipt {
            target: uploaded.web_view_link,
        })
    }
}
