use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Note CRUD for the signed-in user. Every handler receives a validated
/// `AuthUser`, and the repository scopes each query to that user's id.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/notes
        // Sidebar order: most recently updated first.
        .route("/api/notes", get(handlers::get_notes))
        // GET/PUT/DELETE /api/notes/{id}
        .route(
            "/api/notes/{id}",
            get(handlers::get_note)
                .put(handlers::update_note)
                .delete(handlers::delete_note),
        )
}
