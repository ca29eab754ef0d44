//! Drive API upload client: upload bytes, grant public-read access, return a
//! shareable link.
//!
//! Auth is a static bearer access token supplied by configuration; token
//! refresh is the deployment's concern.

use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

/// Client for the Drive HTTP API.
#[derive(Clone)]
pub struct DriveClient {
    base_url: String,
    access_token: String,
    folder_id: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("drive request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("drive api error: {0}")]
    Api(String),
}

/// A stored file: id plus the link a human can open.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub id: String,
    pub web_view_link: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResponse {
    id: String,
    #[serde(default)]
    web_view_link: Option<String>,
}

/// File metadata part of the multipart upload (name + optional parent folder).
fn upload_metadata(filename: &str, folder_id: Option<&str>) -> String {
    let mut meta = serde_json::json!({ "name": filename });
    if let Some(folder) = folder_id {
        meta["parents"] = serde_json::json!([folder]);
    }
    meta.to_string()
}

/// Shareable link for a file id; falls back to the canonical viewer URL when
/// the API response omits webViewLink.
fn view_link(id: &str, from_api: Option<String>) -> String {
    from_api.unwrap_or_else(|| format!("https://drive.google.com/file/d/{}/view", id))
}

impl DriveClient {
    pub fn new(
        base_url: Option<String>,
        access_token: impl Into<String>,
        folder_id: Option<String>,
    ) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            access_token: access_token.into(),
            folder_id,
            client: reqwest::Client::new(),
        }
    }

    /// POST /upload/drive/v3/files?uploadType=multipart — metadata part plus
    /// media part. Returns the file id and view link.
    pub async fn upload(
        &self,
        data: &[u8],
        mime_type: &str,
        filename: &str,
    ) -> Result<UploadedFile, DriveError> {
        let url = format!(
            "{}/upload/drive/v3/files?uploadType=multipart&fields=id,webViewLink",
            self.base_url
        );
        let metadata = upload_metadata(filename, self.folder_id.as_deref());
        let form = reqwest::multipart::Form::new()
            .part(
                "metadata",
                reqwest::multipart::Part::text(metadata).mime_str("application/json")?,
            )
            .part(
                "media",
                reqwest::multipart::Part::bytes(data.to_vec())
                    .file_name(filename.to_string())
                    .mime_str(mime_type)?,
            );
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(DriveError::Api(format!("{} {}", status, body)));
        }
        let file: FileResponse = res.json().await?;
        log::debug!("uploaded {} as file {}", filename, file.id);
        Ok(UploadedFile {
            web_view_link: view_link(&file.id, file.web_view_link),
            id: file.id,
        })
    }

    /// POST /drive/v3/files/{id}/permissions — make the file viewable by
    /// anyone with the link.
    pub async fn share_public(&self, file_id: &str) -> Result<(), DriveError> {
        let url = format!("{}/drive/v3/files/{}/permissions", self.base_url, file_id);
        let body = serde_json::json!({ "role": "reader", "type": "anyone" });
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(DriveError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }
}
