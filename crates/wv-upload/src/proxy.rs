use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};
use wv_types::Cid;

use crate::error::{UploadError, UploadResult, FALLBACK_MESSAGE};
use crate::file::FileUpload;

/// Stores a blob and returns its content id.
#[async_trait]
pub trait ContentUploader: Send + Sync {
    async fn upload(&self, file: FileUpload) -> UploadResult<Cid>;
}

/// Reply body of the upload proxy: `{cid}` on success, `{error}` otherwise.
#[derive(Debug, Default, Deserialize)]
struct ProxyReply {
    cid: Option<String>,
    error: Option<String>,
}

/// Posts files as `multipart/form-data` (field `file`) to the upload proxy.
pub struct ProxyUploader {
    url: String,
    client: Client,
}

impl ProxyUploader {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(url: impl Into<String>) -> UploadResult<Self> {
        let client = Client::builder()
            .timeout(Self::DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ContentUploader for ProxyUploader {
    async fn upload(&self, file: FileUpload) -> UploadResult<Cid> {
        let size = file.len();
        let mut part = Part::bytes(file.bytes).file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| UploadError::Transport(e.to_string()))?;
        }
        let form = Form::new().part("file", part);
        debug!(url = %self.url, file = %file.file_name, size, "uploading");

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        let reply: Option<ProxyReply> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let message = reply
                .and_then(|r| r.error)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
            warn!(status = status.as_u16(), %message, "upload rejected");
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let cid = reply
            .and_then(|r| r.cid)
            .ok_or_else(|| UploadError::MalformedResponse(format!("no cid in {body:?}")))?;
        let cid = Cid::new(cid).map_err(|e| UploadError::MalformedResponse(e.to_string()))?;
        info!(file = %file.file_name, %cid, "content pinned");
        Ok(cid)
    }
}
