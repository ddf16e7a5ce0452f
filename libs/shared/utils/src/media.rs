use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

/// Prefix of every stored media reference returned to clients.
pub const MEDIA_URL_PREFIX: &str = "media";

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Base64 upload payload. `file_data` may carry a `data:<mime>;base64,` prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUpload {
    pub file_data: String,
    pub file_name: Option<String>,
}

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("File data is not valid base64")]
    InvalidEncoding,

    #[error("File is empty")]
    Empty,

    #[error("File exceeds the {0} byte limit")]
    TooLarge(usize),

    #[error("Failed to store file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Io(e) => AppError::Internal(e.to_string()),
            other => AppError::field("file", other.to_string()),
        }
    }
}

/// Local file storage rooted at `MEDIA_ROOT`, laid out as `{kind}/{owner_id}/{file}`.
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            root: PathBuf::from(&config.media_root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the upload and returns its relative reference, e.g.
    /// `media/doctors/<id>/<uuid>.png`.
    pub async fn store(&self, kind: &str, owner_id: &str, upload: &FileUpload) -> Result<String, MediaError> {
        let (mime, encoded) = split_data_url(&upload.file_data);
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|_| MediaError::InvalidEncoding)?;

        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(MediaError::TooLarge(MAX_UPLOAD_BYTES));
        }

        let extension = file_extension(mime, upload.file_name.as_deref());
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let relative = format!("{}/{}/{}", sanitize_segment(kind), sanitize_segment(owner_id), file_name);

        let target = self.root.join(&relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &bytes).await?;

        debug!("Stored {} bytes at {}", bytes.len(), target.display());
        Ok(format!("{}/{}", MEDIA_URL_PREFIX, relative))
    }

    /// Removes a previously stored reference. Missing files are ignored.
    pub async fn remove(&self, reference: &str) {
        let Some(relative) = reference.strip_prefix(&format!("{}/", MEDIA_URL_PREFIX)) else {
            return;
        };
        if relative.split('/').any(|segment| segment == "..") {
            warn!("Refusing to remove media outside the root: {}", reference);
            return;
        }

        let target = self.root.join(relative);
        if let Err(e) = tokio::fs::remove_file(&target).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", target.display(), e);
            }
        }
    }
}

fn split_data_url(data: &str) -> (Option<&str>, &str) {
    match data.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
        Some((meta, payload)) => (meta.split(';').next(), payload),
        None => (None, data),
    }
}

fn file_extension(mime: Option<&str>, file_name: Option<&str>) -> String {
    let from_mime = mime.and_then(|m| match m {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "application/pdf" => Some("pdf"),
        _ => None,
    });
    if let Some(ext) = from_mime {
        return ext.to_string();
    }

    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string())
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}
