use crate::{AppState, handlers, pages};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without an identity. The page routes still pass through
/// the session middleware, which may redirect them before a handler runs.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        .route("/health", get(|| async { "ok" }))
        // Pages: the middleware decides whether these are served or redirected.
        .route("/", get(pages::home))
        .route("/login", get(pages::login_page))
        .route("/sign-up", get(pages::sign_up_page))
        // Sibling note API, called server-side by the session middleware.
        .route("/api/fetch-newest-note", get(handlers::fetch_newest_note))
        .route("/api/create-new-note", post(handlers::create_new_note))
        // GET /api/sidebar
        // Anonymous visitors get a login prompt rather than a 401.
        .route("/api/sidebar", get(handlers::get_sidebar))
        // Auth actions.
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/sign-up", post(handlers::sign_up))
        .route("/api/auth/logout", post(handlers::logout))
}
