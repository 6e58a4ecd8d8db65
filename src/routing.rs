/// RouteClass
///
/// Coarse classification of an inbound path, recomputed per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// `/login` or `/sign-up`.
    AuthRoute,
    /// The application root `/`.
    Home,
    Other,
}

impl RouteClass {
    pub fn is_auth_route(self) -> bool {
        self == RouteClass::AuthRoute
    }
}

pub const LOGIN_PATH: &str = "/login";
pub const SIGN_UP_PATH: &str = "/sign-up";
pub const HOME_PATH: &str = "/";

/// classify
///
/// Maps a request path to its route class. Exact matches only: `/login/` and
/// `/login/extra` are `Other`.
pub fn classify(path: &str) -> RouteClass {
    match path {
        LOGIN_PATH | SIGN_UP_PATH => RouteClass::AuthRoute,
        HOME_PATH => RouteClass::Home,
        _ => RouteClass::Other,
    }
}

// Prefixes the session middleware never runs for.
const EXCLUDED_PREFIXES: &[&str] = &["/_next/static", "/_next/image", "/static/", "/favicon.ico"];

// Image extensions served without touching the session.
const IMAGE_EXTENSIONS: &[&str] = &["svg", "png", "jpg", "jpeg", "gif", "webp"];

/// is_excluded_path
///
/// The inbound matcher: static assets and images bypass the session middleware.
pub fn is_excluded_path(path: &str) -> bool {
    if EXCLUDED_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return true;
    }

    path.rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}
