use axum::{
    extract::{Query, State},
    http::HeaderMap,
};
use maud::{DOCTYPE, Markup, html};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    models::Note,
    routing::{LOGIN_PATH, SIGN_UP_PATH},
};

#[derive(Deserialize)]
pub struct HomeQuery {
    #[serde(rename = "noteId")]
    pub note_id: Option<String>,
}

fn layout(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (title) }
                link rel="stylesheet" href="/static/app.css";
            }
            body {
                main { (body) }
            }
        }
    }
}

/// The editor for the selected note, or the empty state when none is open.
fn note_editor(note: Option<&Note>) -> Markup {
    html! {
        @if let Some(note) = note {
            textarea id="note" data-note-id=(note.id) { (note.text) }
        } @else {
            p { "Select a note from the sidebar." }
        }
    }
}

fn credentials_form(id: &str, action: &str, submit: &str) -> Markup {
    html! {
        form id=(id) data-action=(action) {
            input name="email" type="email";
            input name="password" type="password";
            button type="submit" { (submit) }
        }
    }
}

/// home
///
/// The note editor shell. By the time this runs the session middleware has
/// either redirected or made sure `noteId` is set for signed-in users.
pub async fn home(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HomeQuery>,
) -> Markup {
    let user = AuthUser::resolve(&headers, &state.config).ok();

    let note_id = query.note_id.and_then(|id| Uuid::parse_str(&id).ok());
    let note = match (user, note_id) {
        (Some(user), Some(note_id)) => state.repo.get_note(note_id, user.id).await,
        _ => None,
    };

    layout("Notes", note_editor(note.as_ref()))
}

pub async fn login_page() -> Markup {
    layout(
        "Login",
        html! {
            (credentials_form("login", "/api/auth/login", "Login"))
            a href=(SIGN_UP_PATH) { "Sign up" }
        },
    )
}

pub async fn sign_up_page() -> Markup {
    layout(
        "Sign up",
        html! {
            (credentials_form("sign-up", "/api/auth/sign-up", "Sign up"))
            a href=(LOGIN_PATH) { "Login" }
        },
    )
}
