//! Single-slot cache of the most recent media file posted to the room.

use crate::error::Result;
use crate::protocol::FilesPayload;

use futures::StreamExt as _;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt as _;

/// Extensions the renderer can take as input.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webm", ".mp4"];

/// A remembered attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    /// Extension including the leading dot.
    pub extension: String,
}

impl Attachment {
    /// Stream the file into a temp file with the same extension.
    ///
    /// The returned path deletes the file when dropped.
    pub async fn download(&self, http: &reqwest::Client) -> Result<TempPath> {
        let response = http.get(&self.url).send().await?.error_for_status()?;

        let temp = tempfile::Builder::new()
            .prefix("gluebot-")
            .suffix(&self.extension)
            .tempfile()?;
        let (file, path) = temp.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        tracing::debug!(url = %self.url, path = %path.display(), "downloaded attachment");
        Ok(path)
    }
}

#[derive(Debug, Default)]
pub struct AttachmentCache {
    last: Option<Attachment>,
}

impl AttachmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the first file of an upload unless the bot posted it or the type is unsupported.
    ///
    /// Returns whether the slot was overwritten.
    pub fn observe(&mut self, payload: &FilesPayload, bot_name: &str, base_url: &str) -> bool {
        if payload.name.as_deref() == Some(bot_name) {
            return false;
        }

        let Some(first) = payload.files.first() else {
            return false;
        };
        let (Some(name), Some(extension)) = (first.name.as_deref(), first.extension.as_deref())
        else {
            return false;
        };
        if name.is_empty() || !SUPPORTED_EXTENSIONS.contains(&extension) {
            return false;
        }

        self.last = Some(Attachment {
            url: format!("{base_url}/storage/files/{name}"),
            extension: extension.to_string(),
        });
        true
    }

    pub fn last(&self) -> Option<&Attachment> {
        self.last.as_ref()
    }
}
