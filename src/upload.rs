//! Posting rendered files into a room.

use crate::error::Result;
use crate::protocol::RoomId;
use crate::session::Session;

use anyhow::Context as _;
use reqwest::header;
use reqwest::multipart::{Form, Part};
use std::future::Future;
use std::path::Path;

/// Something that can post a local file into a room.
pub trait Uploader: Send + Sync + 'static {
    /// Upload `path` to `room_id`. Implementations own the file afterwards.
    fn upload(
        &self,
        session: &Session,
        path: &Path,
        room_id: &RoomId,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Multipart upload to `{base}/message/send/{room}`.
#[derive(Debug, Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    base_url: String,
}

impl UploadClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn post(&self, session: &Session, path: &Path, room_id: &RoomId) -> Result<()> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".into());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(&mime_type(path))?;
        let form = Form::new().part("files[]", part);

        let response = self
            .http
            .post(format!("{}/message/send/{room_id}", self.base_url))
            .header(header::COOKIE, session.cookie_header())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        // The body carries nothing we use; read it so the connection can be reused.
        let _ = response.bytes().await;

        if status.is_success() {
            tracing::debug!(%room_id, path = %path.display(), "uploaded file");
        } else {
            tracing::warn!(%room_id, status = status.as_u16(), "upload rejected");
        }

        Ok(())
    }
}

impl Uploader for UploadClient {
    async fn upload(&self, session: &Session, path: &Path, room_id: &RoomId) -> Result<()> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => {}
            _ => {
                tracing::debug!(path = %path.display(), "nothing to upload");
                return Ok(());
            }
        }

        let result = self.post(session, path, room_id).await;
        remove_file(path).await;
        result
    }
}

/// MIME type from the file extension. `jpg` is normalised to `jpeg`.
pub fn mime_type(path: &Path) -> String {
    let extension = path
        .extension()
        .map(|extension| extension.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "webm" | "mp4" => format!("video/{extension}"),
        "jpg" => "image/jpeg".to_string(),
        _ => format!("image/{extension}"),
    }
}

/// Delete a file, logging instead of failing.
pub async fn remove_file(path: &Path) {
    if let Err(error) = tokio::fs::remove_file(path).await
        && error.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(%error, path = %path.display(), "failed to remove file");
    }
}
