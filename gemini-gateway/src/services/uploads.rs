//! Staging of uploaded files on local disk.
//!
//! A [`StagedUpload`] owns its file: the request that created it removes it
//! with [`StagedUpload::remove`], and a guard that is dropped without being
//! removed (early return, multipart error, panic, cancelled request) deletes
//! the file synchronously.

use axum::extract::multipart::{Field, MultipartError};
use axum::http::StatusCode;
use service_core::error::AppError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Directory uploaded files are written to while their request is processed.
pub struct UploadStaging {
    dir: PathBuf,
}

impl UploadStaging {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stream a multipart file field to a fresh file in the staging
    /// directory.
    pub async fn stage(&self, mut field: Field<'_>) -> Result<StagedUpload, AppError> {
        let mut upload = StagedUpload {
            path: self.dir.join(Uuid::new_v4().simple().to_string()),
            mime_type: field
                .content_type()
                .unwrap_or(DEFAULT_MIME_TYPE)
                .to_string(),
            file_name: field.file_name().unwrap_or("unnamed").to_string(),
            size: 0,
            removed: false,
        };

        let mut file = fs::File::create(&upload.path).await?;
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            file.write_all(&chunk).await?;
            upload.size += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::debug!(
            path = %upload.path.display(),
            file_name = %upload.file_name,
            size = upload.size,
            "Upload staged"
        );

        Ok(upload)
    }

    /// Stage in-memory bytes as if they had arrived in a multipart field.
    #[cfg(test)]
    pub(crate) async fn stage_bytes(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<StagedUpload, AppError> {
        let upload = StagedUpload {
            path: self.dir.join(Uuid::new_v4().simple().to_string()),
            mime_type: mime_type.to_string(),
            file_name: file_name.to_string(),
            size: bytes.len() as u64,
            removed: false,
        };
        fs::write(&upload.path, bytes).await?;
        Ok(upload)
    }
}

/// An uploaded file on disk, owned by one request.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    mime_type: String,
    file_name: String,
    size: u64,
    removed: bool,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Media type declared by the client for this part.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        fs::read(&self.path).await
    }

    /// Delete the file. Failures are logged, never returned.
    pub async fn remove(mut self) {
        if let Err(e) = fs::remove_file(&self.path).await {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Error deleting uploaded file"
            );
        }
        self.removed = true;
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Staged upload removed on drop"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Error deleting uploaded file"
            ),
        }
    }
}

/// Map a multipart read failure onto the client-facing error.
pub fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(anyhow::anyhow!(
            "Failed to read multipart form: {}",
            err.body_text()
        ))
    }
}
