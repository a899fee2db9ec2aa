//! Attachment model

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Attachment metadata owned by a note.
///
/// `id` is the storage key issued by the backend when the upload slot was
/// granted; the same key doubles as the retrieval locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Storage key
    pub id: String,
    /// Original file name
    pub name: String,
    /// Content MIME type
    pub mime_type: String,
    /// Attachment size in bytes
    pub size_bytes: u64,
    /// URL or storage key used to fetch the file
    pub url: String,
}

impl Attachment {
    /// Create attachment metadata for an uploaded object.
    pub fn new(
        storage_key: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: u64,
    ) -> Result<Self> {
        let storage_key = storage_key.into().trim().to_string();
        let name = name.into().trim().to_string();
        let mime_type = mime_type.into().trim().to_string();

        if storage_key.is_empty() {
            return Err(Error::Validation(
                "Attachment storage key cannot be empty".to_string(),
            ));
        }
        if name.is_empty() {
            return Err(Error::Validation(
                "Attachment name cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            url: storage_key.clone(),
            id: storage_key,
            name,
            mime_type: if mime_type.is_empty() {
                "application/octet-stream".to_string()
            } else {
                mime_type
            },
            size_bytes,
        })
    }
}
