//! HTTP client for the note service.

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::wire::{
    FullNoteResponse, ListNotesResponse, NoteRef, PresignRequest, PresignResponse,
    SaveNoteRequest, ToggleFavoriteResponse, LIST_FILTER, PRESIGN_ACTION,
};
use super::{NoteBackend, NoteDetail, NoteSummary, UploadSlot};
use crate::config::{AuthHeaderStyle, ClientConfig};
use crate::error::{Error, Result};
use crate::models::{Note, NoteId};
use crate::session::SessionContext;

/// `NoteBackend` speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpNoteBackend {
    base_url: String,
    auth_header: AuthHeaderStyle,
    client: reqwest::Client,
}

impl HttpNoteBackend {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|error| Error::Config(format!("Failed to construct HTTP client: {error}")))?;
        Ok(Self {
            base_url: config.api_base_url.clone(),
            auth_header: config.auth_header,
            client,
        })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(
        &self,
        method: Method,
        route: &str,
        session: &SessionContext,
    ) -> Result<RequestBuilder> {
        let credential = session.require_credential()?;
        let request = self
            .client
            .request(method, format!("{}{}", self.base_url, route))
            .header(reqwest::header::ACCEPT, "application/json");
        Ok(match self.auth_header {
            AuthHeaderStyle::Bearer => request.bearer_auth(credential),
            AuthHeaderStyle::Raw => request.header(reqwest::header::AUTHORIZATION, credential),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        route: &str,
        session: &SessionContext,
        query: &[(&str, &str)],
    ) -> Result<T> {
        tracing::debug!("GET {}", route);
        let response = self
            .authorized(Method::GET, route, session)?
            .query(query)
            .send()
            .await?;
        parse_json(ensure_success(response).await?).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        route: &str,
        session: &SessionContext,
        body: &B,
    ) -> Result<T> {
        tracing::debug!("POST {}", route);
        let response = self
            .authorized(Method::POST, route, session)?
            .json(body)
            .send()
            .await?;
        parse_json(ensure_success(response).await?).await
    }
}

impl NoteBackend for HttpNoteBackend {
    async fn list_notes(&self, session: &SessionContext) -> Result<Vec<NoteSummary>> {
        let email = session.require_user().map_err(into_auth)?;
        let response: ListNotesResponse = self
            .get_json(
                "/getNotes",
                session,
                &[("email", email), ("filter", LIST_FILTER)],
            )
            .await?;
        response.into_summaries()
    }

    async fn save_note(&self, session: &SessionContext, note: &Note) -> Result<()> {
        let email = session.require_user().map_err(into_auth)?;
        let _: serde_json::Value = self
            .post_json("/createNote", session, &SaveNoteRequest::new(email, note))
            .await?;
        Ok(())
    }

    async fn fetch_full_note(&self, session: &SessionContext, id: &NoteId) -> Result<NoteDetail> {
        let email = session.require_user().map_err(into_auth)?;
        let response: FullNoteResponse = self
            .get_json(
                "/getFullNote",
                session,
                &[("email", email), ("noteId", id.as_str())],
            )
            .await?;
        response.into_detail()
    }

    async fn toggle_favorite(&self, session: &SessionContext, id: &NoteId) -> Result<bool> {
        let email = session.require_user().map_err(into_auth)?;
        let body = NoteRef {
            email,
            note_id: id.as_str(),
        };
        let response: ToggleFavoriteResponse =
            self.post_json("/updateNote", session, &body).await?;
        response.into_state()
    }

    async fn delete_note(&self, session: &SessionContext, id: &NoteId) -> Result<()> {
        let email = session.require_user()?;
        let body = NoteRef {
            email,
            note_id: id.as_str(),
        };
        let _: serde_json::Value = self.post_json("/deleteNote", session, &body).await?;
        Ok(())
    }

    async fn request_upload_slot(
        &self,
        session: &SessionContext,
        note_id: &NoteId,
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadSlot> {
        let email = session.require_user().map_err(into_auth)?;
        let body = PresignRequest {
            action: PRESIGN_ACTION,
            email,
            note_id: note_id.as_str(),
            file_name,
            content_type,
        };
        let response: PresignResponse = self.post_json("/createNote", session, &body).await?;
        response.into_slot(file_name)
    }

    async fn upload_bytes(&self, slot: &UploadSlot, content_type: &str, bytes: &[u8]) -> Result<()> {
        tracing::debug!("PUT upload slot for {}", slot.storage_key);
        let response = self
            .client
            .put(&slot.upload_url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

/// A missing user identity on read/write paths is an auth problem, not input validation.
fn into_auth(error: Error) -> Error {
    match error {
        Error::Validation(message) => Error::Auth(message),
        other => other,
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!("Request failed with HTTP {}", status.as_u16());
    Err(Error::from_status(status.as_u16(), &body))
}

/// Empty bodies decode as JSON `null` so `{}`-returning endpoints stay valid.
async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let text = response.text().await?;
    let text = text.trim();
    let payload = if text.is_empty() { "null" } else { text };
    serde_json::from_str(payload).map_err(|error| {
        Error::InvalidPayload(format!("unexpected response body: {error}"))
    })
}
