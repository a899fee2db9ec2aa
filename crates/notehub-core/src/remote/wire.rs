//! JSON schemas of the note service endpoints.
//!
//! Responses are parsed into these types at the boundary and converted into
//! domain models; nothing past this module inspects raw JSON.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use super::{NoteDetail, NoteSummary, UploadSlot};
use crate::error::{Error, Result};
use crate::models::{Attachment, Note, NoteId};
use crate::util::{normalize_text_option, unix_millis_now};

pub const LIST_FILTER: &str = "notes";
pub const PRESIGN_ACTION: &str = "presign";

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveNoteRequest<'a> {
    pub email: &'a str,
    pub note_id: &'a str,
    pub title: &'a str,
    pub note: &'a str,
    pub attachments: Vec<StoredAttachment<'a>>,
}

impl<'a> SaveNoteRequest<'a> {
    pub fn new(email: &'a str, note: &'a Note) -> Self {
        Self {
            email,
            note_id: note.id.as_str(),
            title: &note.title,
            note: &note.content,
            attachments: note.attachments.iter().map(StoredAttachment::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAttachment<'a> {
    pub file_name: &'a str,
    pub size: u64,
    pub content_type: &'a str,
    pub s3_key: &'a str,
}

impl<'a> From<&'a Attachment> for StoredAttachment<'a> {
    fn from(value: &'a Attachment) -> Self {
        Self {
            file_name: &value.name,
            size: value.size_bytes,
            content_type: &value.mime_type,
            s3_key: &value.id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest<'a> {
    pub action: &'static str,
    pub email: &'a str,
    pub note_id: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
}

/// Body shared by the toggle-favorite and delete endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRef<'a> {
    pub email: &'a str,
    pub note_id: &'a str,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListNotesResponse {
    #[serde(default)]
    notes: Vec<WireNoteSummary>,
}

impl ListNotesResponse {
    pub fn into_summaries(self) -> Result<Vec<NoteSummary>> {
        self.notes
            .into_iter()
            .map(WireNoteSummary::into_summary)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireNoteSummary {
    note_id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    created_at: Option<WireTimestamp>,
    #[serde(default)]
    updated_at: Option<WireTimestamp>,
    #[serde(default)]
    favorite: Option<bool>,
    #[serde(default)]
    deleted: Option<bool>,
    #[serde(default)]
    attachments: Option<WireAttachments>,
}

impl WireNoteSummary {
    fn into_summary(self) -> Result<NoteSummary> {
        let id = normalize_text_option(Some(self.note_id))
            .ok_or_else(|| Error::InvalidPayload("note entry is missing noteId".to_string()))?;
        let now = unix_millis_now();
        let created_at = self.created_at.map_or(Ok(now), WireTimestamp::into_millis)?;
        let updated_at = self.updated_at.map_or(Ok(now), WireTimestamp::into_millis)?;

        Ok(NoteSummary {
            id: NoteId::from(id),
            title: self.title.unwrap_or_default(),
            content: self.content,
            created_at,
            updated_at: updated_at.max(created_at),
            is_favorite: self.favorite.unwrap_or(false),
            is_deleted: self.deleted.unwrap_or(false),
            attachments: WireAttachments::into_models(self.attachments)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct FullNoteResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    attachments: Option<WireAttachments>,
}

impl FullNoteResponse {
    pub fn into_detail(self) -> Result<NoteDetail> {
        Ok(NoteDetail {
            title: self.title.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            attachments: WireAttachments::into_models(self.attachments)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ToggleFavoriteResponse {
    favorite: Option<bool>,
}

impl ToggleFavoriteResponse {
    pub fn into_state(self) -> Result<bool> {
        self.favorite.ok_or_else(|| {
            Error::InvalidPayload("toggle response did not include 'favorite'".to_string())
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignResponse {
    upload_url: Option<String>,
    s3_key: Option<String>,
    file_name: Option<String>,
}

impl PresignResponse {
    pub fn into_slot(self, requested_name: &str) -> Result<UploadSlot> {
        let upload_url = normalize_text_option(self.upload_url).ok_or_else(|| {
            Error::InvalidPayload("presign response did not include uploadUrl".to_string())
        })?;
        let storage_key = normalize_text_option(self.s3_key).ok_or_else(|| {
            Error::InvalidPayload("presign response did not include s3Key".to_string())
        })?;
        let file_name =
            normalize_text_option(self.file_name).unwrap_or_else(|| requested_name.to_string());

        Ok(UploadSlot {
            upload_url,
            storage_key,
            file_name,
        })
    }
}

/// Attachment lists arrive either inline or as a JSON-encoded string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireAttachments {
    List(Vec<WireAttachment>),
    Encoded(String),
}

impl WireAttachments {
    fn into_models(value: Option<Self>) -> Result<Vec<Attachment>> {
        let entries = match value {
            None => Vec::new(),
            Some(Self::List(entries)) => entries,
            Some(Self::Encoded(raw)) if raw.trim().is_empty() => Vec::new(),
            Some(Self::Encoded(raw)) => serde_json::from_str(&raw).map_err(|error| {
                Error::InvalidPayload(format!("attachments string is not valid JSON: {error}"))
            })?,
        };
        entries.into_iter().map(WireAttachment::into_model).collect()
    }
}

/// Accepts the storage form (`fileName`, `contentType`, `s3Key`), the client
/// form (`id`, `name`, `type`, `url`), or a record carrying both. Storage keys
/// win when both are present.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAttachment {
    #[serde(default)]
    s3_key: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default, rename = "type")]
    mime_type: Option<String>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    url: Option<String>,
}

impl WireAttachment {
    fn into_model(self) -> Result<Attachment> {
        let id = normalize_text_option(self.s3_key)
            .or_else(|| normalize_text_option(self.id))
            .ok_or_else(|| Error::InvalidPayload("attachment is missing its key".to_string()))?;
        let name = normalize_text_option(self.file_name)
            .or_else(|| normalize_text_option(self.name))
            .unwrap_or_else(|| {
                id.rsplit('/')
                    .next()
                    .map_or_else(|| id.clone(), ToString::to_string)
            });
        let mut attachment = Attachment::new(
            id,
            name,
            normalize_text_option(self.content_type)
                .or(self.mime_type)
                .unwrap_or_default(),
            self.size.unwrap_or(0),
        )?;
        if let Some(url) = normalize_text_option(self.url) {
            attachment.url = url;
        }
        Ok(attachment)
    }
}

/// Timestamps arrive as epoch milliseconds or as RFC 3339 text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Millis(i64),
    Fractional(f64),
    Text(String),
}

impl WireTimestamp {
    #[allow(clippy::cast_possible_truncation)]
    fn into_millis(self) -> Result<i64> {
        match self {
            Self::Millis(value) => Ok(value),
            Self::Fractional(value) => Ok(value.round() as i64),
            Self::Text(raw) => {
                let raw = raw.trim();
                if let Ok(value) = raw.parse::<i64>() {
                    return Ok(value);
                }
                DateTime::parse_from_rfc3339(raw)
                    .map(|parsed| parsed.timestamp_millis())
                    .map_err(|error| {
                        Error::InvalidPayload(format!("invalid timestamp '{raw}': {error}"))
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn save_request_uses_storage_attachment_form() {
        let mut note = Note::with_id(NoteId::from("note-1"));
        note.title = "Title".to_string();
        note.content = "<p>hi</p>".to_string();
        note.attachments
            .push(Attachment::new("k/photo.png", "photo.png", "image/png", 42).unwrap());

        let body = serde_json::to_value(SaveNoteRequest::new("a@example.com", &note)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "email": "a@example.com",
                "noteId": "note-1",
                "title": "Title",
                "note": "<p>hi</p>",
                "attachments": [{
                    "fileName": "photo.png",
                    "size": 42,
                    "contentType": "image/png",
                    "s3Key": "k/photo.png"
                }]
            })
        );
    }

    #[test]
    fn list_response_accepts_mixed_shapes() {
        let payload = r#"{
            "notes": [
                {
                    "noteId": "note-1",
                    "title": "One",
                    "createdAt": "2024-05-01T10:00:00Z",
                    "updatedAt": 1714557600500,
                    "favorite": true,
                    "attachments": "[{\"fileName\":\"a.txt\",\"size\":3,\"contentType\":\"text/plain\",\"s3Key\":\"k/a.txt\"}]"
                },
                {
                    "noteId": "note-2",
                    "content": "<b>full</b>",
                    "deleted": true,
                    "attachments": [{ "id": "k/b.png", "name": "b.png", "type": "image/png", "size": 9, "url": "https://cdn/b.png" }]
                }
            ]
        }"#;

        let summaries = serde_json::from_str::<ListNotesResponse>(payload)
            .unwrap()
            .into_summaries()
            .unwrap();

        assert_eq!(summaries.len(), 2);
        let first = &summaries[0];
        assert_eq!(first.id.as_str(), "note-1");
        assert_eq!(first.created_at, 1_714_557_600_000);
        assert_eq!(first.updated_at, 1_714_557_600_500);
        assert!(first.is_favorite);
        assert!(!first.is_complete());
        assert_eq!(first.attachments[0].name, "a.txt");
        assert_eq!(first.attachments[0].url, "k/a.txt");

        let second = &summaries[1];
        assert!(second.is_deleted);
        assert!(second.is_complete());
        assert_eq!(second.title, "");
        assert_eq!(second.attachments[0].url, "https://cdn/b.png");
    }

    #[test]
    fn list_response_without_notes_is_empty() {
        let summaries = serde_json::from_str::<ListNotesResponse>("{}")
            .unwrap()
            .into_summaries()
            .unwrap();
        assert!(summaries.is_empty());
    }

    #[test]
    fn invalid_timestamp_is_rejected() {
        let payload = r#"{ "notes": [{ "noteId": "n", "createdAt": "yesterday" }] }"#;
        let error = serde_json::from_str::<ListNotesResponse>(payload)
            .unwrap()
            .into_summaries()
            .unwrap_err();
        assert!(matches!(error, Error::InvalidPayload(_)));
    }

    #[test]
    fn attachment_without_name_uses_key_tail() {
        let payload = r#"{ "title": "t", "content": "c", "attachments": [{ "s3Key": "u/n/report.pdf" }] }"#;
        let detail = serde_json::from_str::<FullNoteResponse>(payload)
            .unwrap()
            .into_detail()
            .unwrap();
        assert_eq!(detail.attachments[0].name, "report.pdf");
        assert_eq!(detail.attachments[0].mime_type, "application/octet-stream");
    }

    #[test]
    fn attachment_with_storage_and_client_keys_parses() {
        let payload = r#"{ "title": "t", "content": "c", "attachments": [{
            "id": "old-id", "s3Key": "u/n/a.txt", "name": "a.txt", "fileName": "a.txt",
            "type": "text/plain", "contentType": "text/plain", "size": 3
        }] }"#;
        let detail = serde_json::from_str::<FullNoteResponse>(payload)
            .unwrap()
            .into_detail()
            .unwrap();
        assert_eq!(detail.attachments.len(), 1);
        assert_eq!(detail.attachments[0].id, "u/n/a.txt");
        assert_eq!(detail.attachments[0].name, "a.txt");
        assert_eq!(detail.attachments[0].mime_type, "text/plain");
    }

    #[test]
    fn presign_response_requires_url_and_key() {
        let missing_key = serde_json::from_str::<PresignResponse>(r#"{ "uploadUrl": "https://s3/put" }"#)
            .unwrap()
            .into_slot("a.txt");
        assert!(matches!(missing_key, Err(Error::InvalidPayload(_))));

        let slot = serde_json::from_str::<PresignResponse>(
            r#"{ "uploadUrl": "https://s3/put", "s3Key": "k/a.txt" }"#,
        )
        .unwrap()
        .into_slot("a.txt")
        .unwrap();
        assert_eq!(slot.file_name, "a.txt");
        assert_eq!(slot.storage_key, "k/a.txt");
    }

    #[test]
    fn toggle_response_requires_flag() {
        let response = serde_json::from_str::<ToggleFavoriteResponse>("{}").unwrap();
        assert!(response.into_state().is_err());
    }
}
