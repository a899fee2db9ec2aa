//! Two-phase attachment upload.
//!
//! For each file: ask the backend for an upload slot, then send the bytes
//! straight to the slot's presigned URL. Files are independent; one failing
//! file does not undo the others.

use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{Attachment, NoteId};
use crate::remote::NoteBackend;
use crate::session::SessionContext;

const OCTET_STREAM: &str = "application/octet-stream";

/// A local file waiting to be attached to a note.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type,
            bytes,
        }
    }

    /// Reads a file from disk, guessing its content type from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| {
                Error::Validation(format!("'{}' does not name a file", path.display()))
            })?;
        let bytes = std::fs::read(path)?;
        Ok(Self::new(name, None, bytes))
    }

    /// Content type sent to the backend and the storage service.
    #[must_use]
    pub fn resolved_content_type(&self) -> String {
        infer_mime_type(self.content_type.as_deref(), &self.name)
    }

    pub fn size(&self) -> u64 {
        u64::try_from(self.bytes.len()).unwrap_or(u64::MAX)
    }
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("UploadFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// A file whose upload did not complete.
#[derive(Debug)]
pub struct FailedUpload {
    pub file_name: String,
    pub error: Error,
}

/// Outcome of a multi-file upload, in input order.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub uploaded: Vec<Attachment>,
    pub failed: Vec<FailedUpload>,
}

impl UploadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs the upload-slot + byte-transfer sequence for each file.
pub struct AttachmentUploader<B> {
    backend: Arc<B>,
}

impl<B> Clone for AttachmentUploader<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: NoteBackend> AttachmentUploader<B> {
    pub const fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Uploads every file, best effort per file.
    pub async fn upload_all(
        &self,
        session: &SessionContext,
        note_id: &NoteId,
        files: Vec<UploadFile>,
    ) -> UploadReport {
        let mut report = UploadReport::default();
        for file in files {
            let file_name = file.name.clone();
            match self.upload_one(session, note_id, file).await {
                Ok(attachment) => report.uploaded.push(attachment),
                Err(error) => {
                    tracing::warn!(
                        "Attachment upload failed for '{}' on note {}: {}",
                        file_name,
                        note_id,
                        error
                    );
                    report.failed.push(FailedUpload { file_name, error });
                }
            }
        }
        report
    }

    /// Uploads a single file; metadata is only produced after both phases succeed.
    pub async fn upload_one(
        &self,
        session: &SessionContext,
        note_id: &NoteId,
        file: UploadFile,
    ) -> Result<Attachment> {
        let name = file.name.trim();
        if name.is_empty() {
            return Err(Error::Validation(
                "Attachment file name cannot be empty".to_string(),
            ));
        }
        let content_type = file.resolved_content_type();

        let slot = self
            .backend
            .request_upload_slot(session, note_id, name, &content_type)
            .await?;
        self.backend
            .upload_bytes(&slot, &content_type, &file.bytes)
            .await?;

        tracing::debug!("Uploaded attachment {} for note {}", slot.storage_key, note_id);
        Attachment::new(slot.storage_key, slot.file_name, content_type, file.size())
    }
}

/// Picks a MIME type, preferring an explicit one unless it is generic.
#[must_use]
pub fn infer_mime_type(content_type: Option<&str>, file_name: &str) -> String {
    if let Some(content_type) = content_type {
        let trimmed = content_type.trim();
        if !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case(OCTET_STREAM) {
            return trimmed.to_string();
        }
    }

    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
