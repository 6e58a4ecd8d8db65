use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, header};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::errors::ErrorKind;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use time::Duration;
use uuid::Uuid;

use crate::{auth::decode_access_token, config::AppConfig, models::Credentials};

/// Cookie carrying the provider-issued access token (JWT).
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
/// Cookie carrying the long-lived refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";

/// SessionUser
///
/// The identity attached to a live session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// ProviderUser
///
/// The `user` object embedded in the provider's token responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// SessionTokens
///
/// A freshly issued session, as returned by the provider's `/token` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub user: ProviderUser,
}

impl SessionTokens {
    pub fn session_user(&self) -> SessionUser {
        SessionUser {
            id: self.user.id,
            email: self.user.email.clone(),
        }
    }

    /// Adds both session cookies to `jar`, replacing any inbound values.
    pub fn store_in(self, jar: CookieJar, secure: bool) -> CookieJar {
        jar.add(session_cookie(ACCESS_TOKEN_COOKIE, self.access_token, secure))
            .add(session_cookie(REFRESH_TOKEN_COOKIE, self.refresh_token, secure))
    }
}

/// Lifetime of the session cookies, matching the provider's SSR client.
pub const SESSION_COOKIE_MAX_AGE: Duration = Duration::days(400);

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(SESSION_COOKIE_MAX_AGE)
        .build()
}

/// clear_session_cookies
///
/// Expires both session cookies on the client.
pub fn clear_session_cookies(jar: CookieJar, secure: bool) -> CookieJar {
    let expired = |name: &'static str| {
        Cookie::build((name, ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure)
            .max_age(Duration::ZERO)
            .build()
    };

    jar.add(expired(ACCESS_TOKEN_COOKIE))
        .add(expired(REFRESH_TOKEN_COOKIE))
}

/// AuthError
///
/// Failures while talking to the auth provider or validating its tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Auth session missing")]
    SessionMissing,

    #[error("invalid access token: {0}")]
    InvalidToken(String),

    #[error("auth provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("auth provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed auth provider response: {0}")]
    Malformed(String),
}

impl AuthError {
    /// A user-presentable message, used for action responses.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Rejected { message, .. } if !message.is_empty() => message.clone(),
            AuthError::SessionMissing => "You are not signed in".to_string(),
            _ => "Authentication service unavailable".to_string(),
        }
    }
}

/// SessionStore
///
/// Contract for the cookie-based session client. The middleware only ever
/// talks to this trait, so tests swap in an in-memory implementation.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolves the session carried by `jar`.
    ///
    /// Returns the (possibly refreshed) cookie jar alongside the user. A jar
    /// with no session cookies at all is an empty session, not an error.
    async fn get_user(&self, jar: CookieJar) -> Result<(CookieJar, Option<SessionUser>), AuthError>;

    /// Password sign-in.
    async fn sign_in(&self, credentials: &Credentials) -> Result<SessionTokens, AuthError>;

    async fn sign_up(&self, credentials: &Credentials) -> Result<(), AuthError>;

    /// Revokes the session identified by `access_token` at the provider.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

/// SessionState
///
/// The shared handle to the session client held in the application state.
pub type SessionState = Arc<dyn SessionStore>;

/// RefreshedSession
///
/// Output of the refresh step: the cookie set to forward and to send back,
/// plus the session user (if any). Callers apply `jar` to the request they
/// forward and to whatever response they end up returning.
#[derive(Debug)]
pub struct RefreshedSession {
    pub jar: CookieJar,
    pub user: Option<SessionUser>,
}

impl RefreshedSession {
    /// Rewrites the `Cookie` header so downstream handlers see the refreshed values.
    pub fn apply_to_request(&self, headers: &mut HeaderMap) {
        let cookie_line = self
            .jar
            .iter()
            // The jar holds decoded values; re-encode so `;` and control
            // characters survive the round trip.
            .map(|cookie| cookie.stripped().encoded().to_string())
            .collect::<Vec<_>>()
            .join("; ");

        if cookie_line.is_empty() {
            headers.remove(header::COOKIE);
            return;
        }

        match HeaderValue::from_str(&cookie_line) {
            Ok(value) => {
                headers.insert(header::COOKIE, value);
            }
            Err(e) => {
                // Never forward the stale session.
                tracing::warn!(error = %e, "could not rebuild cookie header, dropping it");
                headers.remove(header::COOKIE);
            }
        }
    }
}

/// refresh_session
///
/// The session refresh step. Must complete before any note lookup.
pub async fn refresh_session(
    store: &dyn SessionStore,
    jar: CookieJar,
) -> Result<RefreshedSession, AuthError> {
    let (jar, user) = store.get_user(jar).await?;
    Ok(RefreshedSession { jar, user })
}

/// SupabaseSessionClient
///
/// Session client backed by the Supabase GoTrue REST API. Access tokens are
/// validated locally with the project's JWT secret; the provider is only
/// contacted to refresh, sign in, sign up, or sign out.
#[derive(Clone)]
pub struct SupabaseSessionClient {
    client: reqwest::Client,
    auth_url: String,
    anon_key: String,
    jwt_secret: String,
    cookie_secure: bool,
}

/// Error body shapes used by the provider across endpoints.
#[derive(Deserialize, Default)]
struct ProviderErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl SupabaseSessionClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            auth_url: format!("{}/auth/v1", config.supabase_url.trim_end_matches('/')),
            anon_key: config.supabase_anon_key.clone(),
            jwt_secret: config.jwt_secret.clone(),
            cookie_secure: config.cookie_secure,
        }
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<SessionTokens, AuthError> {
        let response = self
            .client
            .post(format!("{}/token", self.auth_url))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        response
            .json::<SessionTokens>()
            .await
            .map_err(|e| AuthError::Malformed(e.to_string()))
    }
}

/// Converts a non-success provider response into `AuthError::Rejected`.
async fn rejection(response: reqwest::Response) -> AuthError {
    let status = response.status().as_u16();
    let body = response
        .json::<ProviderErrorBody>()
        .await
        .unwrap_or_default();

    let message = body
        .error_description
        .or(body.msg)
        .or(body.message)
        .unwrap_or_default();

    AuthError::Rejected { status, message }
}

#[async_trait]
impl SessionStore for SupabaseSessionClient {
    async fn get_user(&self, jar: CookieJar) -> Result<(CookieJar, Option<SessionUser>), AuthError> {
        let access_token = jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string());
        let refresh_token = jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string());

        if let Some(token) = access_token.as_deref() {
            match decode_access_token(token, &self.jwt_secret) {
                Ok(claims) => {
                    let user = SessionUser {
                        id: claims.sub,
                        email: claims.email,
                    };
                    return Ok((jar, Some(user)));
                }
                Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                    tracing::debug!("access token expired, attempting refresh");
                }
                Err(e) => return Err(AuthError::InvalidToken(e.to_string())),
            }
        }

        match refresh_token {
            Some(refresh_token) => {
                let tokens = self
                    .token_grant(
                        "refresh_token",
                        serde_json::json!({ "refresh_token": refresh_token }),
                    )
                    .await?;
                let user = tokens.session_user();
                tracing::debug!(user_id = %user.id, "session refreshed");
                Ok((tokens.store_in(jar, self.cookie_secure), Some(user)))
            }
            // An expired access token with nothing to refresh it with.
            None if access_token.is_some() => Err(AuthError::SessionMissing),
            None => Ok((jar, None)),
        }
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<SessionTokens, AuthError> {
        self.token_grant(
            "password",
            serde_json::json!({ "email": credentials.email, "password": credentials.password }),
        )
        .await
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let response = self
            .client
            .post(format!("{}/signup", self.auth_url))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": credentials.email, "password": credentials.password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }
}
