use async_trait::async_trait;
use reqwest::{StatusCode, header};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CreateNoteResponse, NewestNoteResponse};

/// NoteLookup
///
/// Outcome of asking the sibling API for a user's newest note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteLookup {
    Found(String),
    NotFound,
}

#[derive(Debug, Error)]
pub enum NoteApiError {
    #[error("note api unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("note api returned status {0}")]
    Status(u16),

    #[error("note api response is not JSON")]
    NotJson,

    #[error("note api response could not be decoded: {0}")]
    Decode(String),
}

/// NoteApi
///
/// The two outbound calls the session middleware makes. No retries, no
/// timeout beyond the client default, and no idempotency guarantee.
#[async_trait]
pub trait NoteApi: Send + Sync {
    async fn fetch_newest_note(&self, user_id: Uuid) -> Result<NoteLookup, NoteApiError>;

    /// Creates an empty note and returns its id.
    async fn create_note(&self, user_id: Uuid) -> Result<String, NoteApiError>;
}

pub type NoteApiState = Arc<dyn NoteApi>;

/// HttpNoteApi
///
/// Calls `/api/fetch-newest-note` and `/api/create-new-note` on `base_url`.
#[derive(Clone)]
pub struct HttpNoteApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNoteApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn is_json(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.contains("application/json"))
        .unwrap_or(false)
}

#[async_trait]
impl NoteApi for HttpNoteApi {
    async fn fetch_newest_note(&self, user_id: Uuid) -> Result<NoteLookup, NoteApiError> {
        let response = self
            .client
            .get(format!("{}/api/fetch-newest-note", self.base_url))
            .query(&[("userId", user_id.to_string())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(NoteLookup::NotFound);
        }
        if !status.is_success() {
            return Err(NoteApiError::Status(status.as_u16()));
        }
        if !is_json(&response) {
            return Err(NoteApiError::NotJson);
        }

        let body = response
            .json::<NewestNoteResponse>()
            .await
            .map_err(|e| NoteApiError::Decode(e.to_string()))?;

        // A 2xx without an id means the user has no notes yet.
        Ok(match body.newest_note_id {
            Some(id) if !id.is_empty() => NoteLookup::Found(id),
            _ => NoteLookup::NotFound,
        })
    }

    async fn create_note(&self, user_id: Uuid) -> Result<String, NoteApiError> {
        let response = self
            .client
            .post(format!("{}/api/create-new-note", self.base_url))
            .query(&[("userId", user_id.to_string())])
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NoteApiError::Status(status.as_u16()));
        }

        let body = response
            .json::<CreateNoteResponse>()
            .await
            .map_err(|e| NoteApiError::Decode(e.to_string()))?;

        Ok(body.note_id)
    }
}
