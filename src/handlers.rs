use crate::{
    AppConfig, AppState, RepositoryState, SessionState,
    auth::AuthUser,
    models::{
        ActionResponse, CreateNoteResponse, Credentials, NewestNoteResponse, Note, SidebarView,
        Toast, UpdateNoteRequest,
    },
    routing::LOGIN_PATH,
    session::{ACCESS_TOKEN_COOKIE, clear_session_cookies},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

// --- Query Structs ---

/// UserQuery
///
/// `?userId=<uuid>` as sent by the session middleware to the sibling note API.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct UserQuery {
    /// Owner of the notes being looked up or created.
    #[serde(rename = "userId")]
    pub user_id: Uuid,
}

// --- Sibling Note API ---

/// fetch_newest_note
///
/// [Public Route] Returns the id of the user's most recently updated note.
/// 404 means the user has no notes; the middleware reacts by creating one.
#[utoipa::path(
    get,
    path = "/api/fetch-newest-note",
    params(UserQuery),
    responses(
        (status = 200, description = "Newest note", body = NewestNoteResponse),
        (status = 404, description = "User has no notes")
    )
)]
pub async fn fetch_newest_note(
    State(repo): State<RepositoryState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<NewestNoteResponse>, StatusCode> {
    match repo.get_newest_note(query.user_id).await {
        Some(note) => Ok(Json(NewestNoteResponse {
            newest_note_id: Some(note.id.to_string()),
        })),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// create_new_note
///
/// [Public Route] Creates an empty note for `userId` and returns its id.
#[utoipa::path(
    post,
    path = "/api/create-new-note",
    params(UserQuery),
    responses(
        (status = 200, description = "Created", body = CreateNoteResponse),
        (status = 500, description = "Insert failed")
    )
)]
pub async fn create_new_note(
    State(repo): State<RepositoryState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<CreateNoteResponse>, StatusCode> {
    match repo.create_note(query.user_id).await {
        Some(note) => Ok(Json(CreateNoteResponse {
            note_id: note.id.to_string(),
        })),
        None => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

// --- Sidebar ---

/// get_sidebar
///
/// [Public Route] Sidebar data. Signed-in users get their notes newest-first;
/// anonymous visitors get a login prompt and no notes.
#[utoipa::path(
    get,
    path = "/api/sidebar",
    responses((status = 200, description = "Sidebar", body = SidebarView))
)]
pub async fn get_sidebar(State(state): State<AppState>, headers: HeaderMap) -> Json<SidebarView> {
    match AuthUser::resolve(&headers, &state.config) {
        Ok(user) => Json(SidebarView {
            label: "Your notes".to_string(),
            login_href: None,
            notes: state.repo.get_notes(user.id).await,
        }),
        Err(_) => Json(SidebarView {
            label: "Login to see your notes".to_string(),
            login_href: Some(LOGIN_PATH.to_string()),
            notes: vec![],
        }),
    }
}

// --- Notes (Authenticated) ---

/// get_notes
///
/// [Authenticated Route] All notes of the caller, most recently updated first.
#[utoipa::path(
    get,
    path = "/api/notes",
    responses((status = 200, description = "My notes", body = [Note]))
)]
pub async fn get_notes(
    AuthUser { id, .. }: AuthUser,
    State(repo): State<RepositoryState>,
) -> Json<Vec<Note>> {
    Json(repo.get_notes(id).await)
}

/// get_note
///
/// [Authenticated Route] A single note. Foreign notes are reported as 404.
#[utoipa::path(
    get,
    path = "/api/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Found", body = Note),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_note(
    AuthUser { id: user_id, .. }: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Note>, StatusCode> {
    repo.get_note(id, user_id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// update_note
///
/// [Authenticated Route] Saves the note body. Owner-only.
#[utoipa::path(
    put,
    path = "/api/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Updated", body = Note),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_note(
    AuthUser { id: user_id, .. }: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNoteRequest>,
) -> Result<Json<Note>, StatusCode> {
    repo.update_note(id, user_id, payload.text)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// delete_note
///
/// [Authenticated Route] Deletes a note. Owner-only.
#[utoipa::path(
    delete,
    path = "/api/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_note(
    AuthUser { id: user_id, .. }: AuthUser,
    State(repo): State<RepositoryState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if repo.delete_note(id, user_id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- Auth Actions ---

/// login
///
/// [Public Route] Password sign-in. On success the session cookies are set.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Logged in", body = ActionResponse),
        (status = 401, description = "Rejected", body = ActionResponse)
    )
)]
pub async fn login(
    State(sessions): State<SessionState>,
    State(config): State<AppConfig>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> (StatusCode, CookieJar, Json<ActionResponse>) {
    match sessions.sign_in(&credentials).await {
        Ok(tokens) => {
            let jar = tokens.store_in(jar, config.cookie_secure);
            let toast = Toast::success("Logged in", "You have been successfully logged in");
            (StatusCode::OK, jar, Json(ActionResponse::ok(toast)))
        }
        Err(e) => {
            tracing::warn!(error = %e, "login failed");
            (StatusCode::UNAUTHORIZED, jar, Json(ActionResponse::failed(e.user_message())))
        }
    }
}

/// sign_up
///
/// [Public Route] Registers a new account with the auth provider.
#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    request_body = Credentials,
    responses(
        (status = 200, description = "Signed up", body = ActionResponse),
        (status = 400, description = "Rejected", body = ActionResponse)
    )
)]
pub async fn sign_up(
    State(sessions): State<SessionState>,
    Json(credentials): Json<Credentials>,
) -> (StatusCode, Json<ActionResponse>) {
    match sessions.sign_up(&credentials).await {
        Ok(()) => {
            let toast = Toast::success("Signed up", "Check your email for a confirmation link");
            (StatusCode::OK, Json(ActionResponse::ok(toast)))
        }
        Err(e) => {
            tracing::warn!(error = %e, "sign-up failed");
            (StatusCode::BAD_REQUEST, Json(ActionResponse::failed(e.user_message())))
        }
    }
}

/// logout
///
/// [Public Route] Revokes the session at the provider and expires both
/// session cookies. A request without a session succeeds trivially.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = ActionResponse),
        (status = 502, description = "Provider error", body = ActionResponse)
    )
)]
pub async fn logout(
    State(sessions): State<SessionState>,
    State(config): State<AppConfig>,
    jar: CookieJar,
) -> (StatusCode, CookieJar, Json<ActionResponse>) {
    tracing::info!("logging out");

    let access_token = jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string());
    if let Some(token) = access_token {
        if let Err(e) = sessions.sign_out(&token).await {
            tracing::error!(error = %e, "logout failed");
            return (
                StatusCode::BAD_GATEWAY,
                jar,
                Json(ActionResponse::failed(e.user_message())),
            );
        }
    }

    let jar = clear_session_cookies(jar, config.cookie_secure);
    let toast = Toast::success("Logged out", "You've successfully logged out");
    (StatusCode::OK, jar, Json(ActionResponse::ok(toast)))
}
