use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use super::staging::StagedFile;
use crate::storage::StorageClient;

#[derive(Debug, Clone)]
pub struct UploadedMedia {
    pub url: String,
}

/// Hands a local file to the media host and returns where it is served from.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(&self, local_path: &Path) -> anyhow::Result<UploadedMedia>;
}

/// Uploads into an object store bucket and builds public URLs from a base.
pub struct ObjectStoreUploader {
    storage: Arc<dyn StorageClient>,
    public_url: String,
}

impl ObjectStoreUploader {
    pub fn new(storage: Arc<dyn StorageClient>, public_url: &str) -> Self {
        Self {
            storage,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaUploader for ObjectStoreUploader {
    async fn upload(&self, local_path: &Path) -> anyhow::Result<UploadedMedia> {
        let body = tokio::fs::read(local_path)
            .await
            .with_context(|| format!("read {}", local_path.display()))?;

        let ext = local_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin")
            .to_ascii_lowercase();
        let content_type = mime_from_ext(&ext).unwrap_or("application/octet-stream");
        let key = format!("uploads/{}.{}", Uuid::new_v4(), ext);

        self.storage
            .put_object(&key, Bytes::from(body), content_type)
            .await?;
        debug!(key = %key, "media uploaded");

        Ok(UploadedMedia {
            url: format!("{}/{}", self.public_url, key),
        })
    }
}

/// Uploads a staged file if there is one. Absence and failure both yield
/// `None`; the caller decides whether that is fatal.
pub async fn upload_staged(
    uploader: &dyn MediaUploader,
    file: Option<&StagedFile>,
) -> Option<UploadedMedia> {
    let file = file?;
    match uploader.upload(file.path()).await {
        Ok(media) => Some(media),
        Err(e) => {
            warn!(error = ?e, path = %file.path().display(), "media upload failed");
            None
        }
    }
}

pub(crate) fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

fn mime_from_ext(ext: &str) -> Option<&'static str> {
    match ext {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}
