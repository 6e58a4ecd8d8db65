use axum::{
    extract::{FromRef, Request},
    http::HeaderName,
    Router,
    middleware::{from_fn_with_state, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod note_api;
pub mod pages;
pub mod repository;
pub mod routing;
pub mod session;

pub mod routes;
use routes::{authenticated, public};
use auth::AuthUser;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use note_api::{HttpNoteApi, NoteApiState};
pub use repository::{PostgresRepository, RepositoryState};
pub use session::{SessionState, SupabaseSessionClient};

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::fetch_newest_note, handlers::create_new_note, handlers::get_sidebar,
        handlers::get_notes, handlers::get_note, handlers::update_note, handlers::delete_note,
        handlers::login, handlers::sign_up, handlers::logout
    ),
    components(
        schemas(
            models::Note, models::NewestNoteResponse, models::CreateNoteResponse,
            models::UpdateNoteRequest, models::Credentials, models::ActionResponse,
            models::Toast, models::ToastVariant, models::SidebarView,
        )
    ),
    tags(
        (name = "notes-portal", description = "Notes API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of services and configuration, cloned per request.
#[derive(Clone)]
pub struct AppState {
    /// Note persistence.
    pub repo: RepositoryState,
    /// Cookie-based session client for the auth provider.
    pub sessions: SessionState,
    /// Outbound calls to the sibling note API, used by the session middleware.
    pub notes_api: NoteApiState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects the request with 401 unless an `AuthUser` can be extracted.
async fn auth_middleware(
    _auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles routes, the session middleware, and the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(from_fn_with_state(
                    state.clone(),
                    auth_middleware
                ))
        )
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        // Session-aware routing runs before every handler.
        .layer(from_fn_with_state(
            state.clone(),
            crate::middleware::session_middleware,
        ))
        .with_state(state);

    base_router
        .layer(
             ServiceBuilder::new()
                 .layer(SetRequestIdLayer::new(
                     x_request_id.clone(),
                     MakeRequestUuid,
                 ))
                 .layer(
                     TraceLayer::new_for_http()
                         .make_span_with(trace_span_logger)
                         .on_response(
                             DefaultOnResponse::new()
                                 .level(Level::INFO)
                                 .latency_unit(tower_http::LatencyUnit::Millis)
                         )
                 )
                 .layer(PropagateRequestIdLayer::new(x_request_id))
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span per request carrying method, URI, and the `x-request-id` so every log
/// line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
