use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use reqwest::Url;
use uuid::Uuid;

use crate::{
    AppState,
    note_api::{NoteApi, NoteLookup},
    routing::{self, HOME_PATH, LOGIN_PATH, RouteClass},
    session::{AuthError, SessionUser, refresh_session},
};

/// Query parameter selecting the open note on the home page.
pub const NOTE_ID_PARAM: &str = "noteId";

/// Outcome of the refresh step as seen by the decision procedure.
pub type SessionResult = Result<Option<SessionUser>, AuthError>;

fn query_pairs(query: &str) -> Vec<(String, String)> {
    Url::parse(&format!("http://localhost/?{query}"))
        .map(|url| {
            url.query_pairs()
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

/// RedirectTarget
///
/// Where a redirect decision sends the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    Login,
    Home,
    /// The home page with `noteId` set.
    Note(String),
}

impl RedirectTarget {
    /// location
    ///
    /// Renders the target as an absolute redirect URL against `base_url`.
    /// `Note` keeps whatever other query parameters the request carried.
    pub fn location(&self, base_url: &str, query: Option<&str>) -> String {
        let base = base_url.trim_end_matches('/');
        match self {
            RedirectTarget::Login => format!("{base}{LOGIN_PATH}"),
            RedirectTarget::Home => format!("{base}{HOME_PATH}"),
            RedirectTarget::Note(note_id) => {
                let Ok(mut url) = Url::parse(&format!("{base}{HOME_PATH}")) else {
                    return format!("{base}{HOME_PATH}?{NOTE_ID_PARAM}={note_id}");
                };

                let kept = query.map(query_pairs).unwrap_or_default();
                {
                    let mut pairs = url.query_pairs_mut();
                    for (key, value) in kept.iter().filter(|(key, _)| key != NOTE_ID_PARAM) {
                        pairs.append_pair(key, value);
                    }
                    pairs.append_pair(NOTE_ID_PARAM, note_id);
                }
                url.to_string()
            }
        }
    }
}

/// Decision
///
/// The outcome of the decision procedure: exactly one per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Redirect(RedirectTarget),
}

/// RouteRequest
///
/// Holds the per-request inputs of the decision procedure.
#[derive(Debug, Clone, Copy)]
pub struct RouteRequest<'a> {
    pub class: RouteClass,
    pub query: Option<&'a str>,
}

impl<'a> RouteRequest<'a> {
    pub fn new(path: &str, query: Option<&'a str>) -> Self {
        Self {
            class: routing::classify(path),
            query,
        }
    }

    /// True when the first `noteId` in the query is non-empty. Later
    /// duplicates are ignored.
    pub fn has_note_id(&self) -> bool {
        self.query
            .and_then(|q| {
                query_pairs(q)
                    .into_iter()
                    .find(|(key, _)| key == NOTE_ID_PARAM)
            })
            .map(|(_, value)| !value.is_empty())
            .unwrap_or(false)
    }

    /// Whether the session has to be resolved at all for this request.
    pub fn needs_session(&self) -> bool {
        match self.class {
            RouteClass::AuthRoute => true,
            RouteClass::Home => !self.has_note_id(),
            RouteClass::Other => false,
        }
    }
}

/// decide
///
/// The redirect decision procedure. `session` is the already-completed refresh
/// step, `None` when the route never needed one.
///
/// | route            | session        | outcome                           |
/// |------------------|----------------|-----------------------------------|
/// | auth route       | user           | redirect `/`                      |
/// | auth route       | none / error   | continue                          |
/// | `/` no `noteId`  | none           | redirect `/login`                 |
/// | `/` no `noteId`  | error          | `Err`, handled by [`resolve`]     |
/// | `/` no `noteId`  | user           | newest note, else create one      |
/// | anything else    | -              | continue                          |
///
/// Lookup and creation failures degrade to `Continue`.
pub async fn decide(
    request: RouteRequest<'_>,
    session: Option<SessionResult>,
    notes: &dyn NoteApi,
) -> Result<Decision, AuthError> {
    if !request.needs_session() {
        return Ok(Decision::Continue);
    }
    let Some(session) = session else {
        return Ok(Decision::Continue);
    };

    match request.class {
        RouteClass::AuthRoute => match session {
            Ok(Some(_)) => Ok(Decision::Redirect(RedirectTarget::Home)),
            Ok(None) => Ok(Decision::Continue),
            Err(e) => {
                tracing::info!(error = %e, "auth error on auth route, continuing");
                Ok(Decision::Continue)
            }
        },
        RouteClass::Home => match session? {
            Some(user) => Ok(resolve_note(user.id, notes).await),
            None => Ok(Decision::Redirect(RedirectTarget::Login)),
        },
        RouteClass::Other => Ok(Decision::Continue),
    }
}

/// Redirects to the user's newest note, creating one when none exists.
/// Creation is attempted at most once and never retried.
async fn resolve_note(user_id: Uuid, notes: &dyn NoteApi) -> Decision {
    let note_id = match notes.fetch_newest_note(user_id).await {
        Ok(NoteLookup::Found(id)) => id,
        Ok(NoteLookup::NotFound) => match notes.create_note(user_id).await {
            Ok(id) => {
                tracing::info!(%user_id, note_id = %id, "created first note");
                id
            }
            Err(e) => {
                tracing::error!(%user_id, error = %e, "failed to create note");
                return Decision::Continue;
            }
        },
        Err(e) => {
            tracing::error!(%user_id, error = %e, "failed to fetch newest note");
            return Decision::Continue;
        }
    };

    Decision::Redirect(RedirectTarget::Note(note_id))
}

/// resolve
///
/// The caller one level above [`decide`]: a session error becomes a login
/// redirect unless the request is already on an auth route.
pub fn resolve(result: Result<Decision, AuthError>, class: RouteClass) -> Decision {
    match result {
        Ok(decision) => decision,
        Err(e) if class.is_auth_route() => {
            tracing::error!(error = %e, "middleware error handled");
            Decision::Continue
        }
        Err(e) => {
            tracing::info!(error = %e, "user not authenticated, redirecting to login");
            Decision::Redirect(RedirectTarget::Login)
        }
    }
}

/// session_middleware
///
/// Runs for every non-asset request: refreshes the session where the route
/// needs one, decides, then forwards the request or redirects. Refreshed
/// cookies are written to the forwarded request and to the response.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if routing::is_excluded_path(&path) {
        return next.run(request).await;
    }

    let query = request.uri().query().map(str::to_string);
    let route = RouteRequest::new(&path, query.as_deref());

    let mut refreshed_jar: Option<CookieJar> = None;
    let session = if route.needs_session() {
        let jar = CookieJar::from_headers(request.headers());
        let result = match refresh_session(state.sessions.as_ref(), jar).await {
            Ok(refreshed) => {
                refreshed.apply_to_request(request.headers_mut());
                refreshed_jar = Some(refreshed.jar);
                Ok(refreshed.user)
            }
            Err(e) => Err(e),
        };
        Some(result)
    } else {
        None
    };

    let result = decide(route, session, state.notes_api.as_ref()).await;
    let response = match resolve(result, route.class) {
        Decision::Continue => next.run(request).await,
        Decision::Redirect(target) => {
            let location = target.location(&state.config.base_url, query.as_deref());
            tracing::debug!(%path, %location, "redirecting");
            Redirect::temporary(&location).into_response()
        }
    };

    match refreshed_jar {
        Some(jar) => (jar, response).into_response(),
        None => response,
    }
}
