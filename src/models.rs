use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Note
///
/// A single note from the `notes` table. Ownership is the auth provider's user id.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Note {
    pub id: Uuid,
    // FK to the provider's auth.users.id.
    pub author_id: Uuid,
    pub text: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    // Drives the sidebar ordering and "newest note" lookups.
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Sibling Note API Payloads ---

/// Body of `GET /api/fetch-newest-note`. The id is absent when the user has no notes.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewestNoteResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newest_note_id: Option<String>,
}

/// Body of `POST /api/create-new-note`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateNoteResponse {
    pub note_id: String,
}

/// UpdateNoteRequest
///
/// Replaces the note body. Saving bumps `updated_at`, which moves the note
/// to the top of the sidebar.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateNoteRequest {
    pub text: String,
}

// --- Auth Actions ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// ToastVariant
///
/// Visual style of a client-side toast. Serialized lowercase to match the
/// frontend's variant names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ToastVariant {
    #[default]
    Default,
    Destructive,
    Success,
}

/// Toast
///
/// A notification the client should display after an action completes.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
    pub duration_ms: u32,
}

/// How long action toasts stay on screen.
pub const TOAST_DURATION_MS: u32 = 5000;

impl Toast {
    pub fn success(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: ToastVariant::Success,
            duration_ms: TOAST_DURATION_MS,
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            description: description.into(),
            variant: ToastVariant::Destructive,
            duration_ms: TOAST_DURATION_MS,
        }
    }
}

/// ActionResponse
///
/// Result of a login, sign-up, or logout action. `errorMessage` is null on success.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ActionResponse {
    pub error_message: Option<String>,
    pub toast: Toast,
}

impl ActionResponse {
    pub fn ok(toast: Toast) -> Self {
        Self {
            error_message: None,
            toast,
        }
    }

    pub fn failed(message: String) -> Self {
        Self {
            toast: Toast::error(message.clone()),
            error_message: Some(message),
        }
    }
}

// --- Sidebar ---

/// SidebarView
///
/// Data behind the notes sidebar. Anonymous visitors get a login prompt and
/// an empty list instead of an error.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SidebarView {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_href: Option<String>,
    pub notes: Vec<Note>,
}
