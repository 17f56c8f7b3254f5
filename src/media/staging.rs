use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use tracing::{debug, warn};
use uuid::Uuid;

use super::services::ext_from_mime;
use crate::error::{AppError, AppResult};

/// A multipart file written to the local temp dir. Removed on drop.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %e, path = %self.path.display(), "failed to remove staged file");
            }
        }
    }
}

/// Text fields and staged files of one multipart request.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, StagedFile>,
}

impl MultipartForm {
    pub async fn read(mut mp: Multipart, temp_dir: &Path) -> AppResult<Self> {
        let mut form = MultipartForm::default();
        while let Some(field) = mp.next_field().await.map_err(bad_multipart)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if field.file_name().is_none() {
                let value = field.text().await.map_err(bad_multipart)?;
                form.fields.insert(name, value);
                continue;
            }

            let ext = field
                .content_type()
                .and_then(ext_from_mime)
                .or_else(|| field.file_name().and_then(ext_from_file_name))
                .unwrap_or("bin")
                .to_string();
            let data = field.bytes().await.map_err(bad_multipart)?;
            if data.is_empty() {
                continue;
            }

            tokio::fs::create_dir_all(temp_dir)
                .await
                .map_err(|e| AppError::from(anyhow::Error::new(e).context("create temp dir")))?;
            let path = temp_dir.join(format!("{}.{}", Uuid::new_v4(), ext));
            tokio::fs::write(&path, &data)
                .await
                .map_err(|e| AppError::from(anyhow::Error::new(e).context("stage upload")))?;
            debug!(field = %name, bytes = data.len(), "file staged");

            form.files.insert(name, StagedFile { path });
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn file(&self, name: &str) -> Option<&StagedFile> {
        self.files.get(name)
    }
}

fn ext_from_file_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("jpg"),
        "png" => Some("png"),
        "webp" => Some("webp"),
        "gif" => Some("gif"),
        "heic" => Some("heic"),
        _ => None,
    }
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
}
