use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode, errors::Error as JwtError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    session::ACCESS_TOKEN_COOKIE,
};

/// Claims
///
/// The subset of the provider-issued access token payload this service reads.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the provider's user UUID. Notes are owned by this id.
    pub sub: Uuid,
    /// Present on password accounts.
    pub email: Option<String>,
    /// Expiration Time (exp).
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
}

/// decode_access_token
///
/// Validates an HS256 access token against the shared provider secret.
/// Expiry is always enforced; the audience claim is not checked because the
/// provider issues tokens for a fixed `authenticated` audience.
pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.validate_aud = false;
    // Expiry is exact so a token is refreshed the moment it lapses.
    validation.leeway = 0;

    decode::<Claims>(token, &decoding_key, &validation).map(|data| data.claims)
}

/// AuthUser
///
/// The resolved identity of an authenticated API request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

impl AuthUser {
    /// resolve
    ///
    /// Resolution order:
    /// 1. Local bypass: in `Env::Local`, a valid UUID in `x-user-id` is accepted as-is.
    /// 2. `Authorization: Bearer <token>`.
    /// 3. The `sb-access-token` session cookie.
    ///
    /// Rejection is always `401 Unauthorized`. Expired cookies are not refreshed
    /// here; the session middleware has already refreshed them for page routes.
    pub fn resolve(headers: &HeaderMap, config: &AppConfig) -> Result<Self, StatusCode> {
        if config.env == Env::Local {
            let bypass = headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|id| Uuid::parse_str(id).ok());
            if let Some(id) = bypass {
                return Ok(AuthUser { id, email: None });
            }
        }

        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);

        let token = match bearer {
            Some(token) => token,
            None => CookieJar::from_headers(headers)
                .get(ACCESS_TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_string())
                .ok_or(StatusCode::UNAUTHORIZED)?,
        };

        let claims = decode_access_token(&token, &config.jwt_secret).map_err(|e| {
            tracing::debug!(error = %e, "access token rejected");
            StatusCode::UNAUTHORIZED
        })?;

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}

/// Lets any handler take `AuthUser` as an argument; the request is rejected with
/// 401 before the handler runs if no identity can be resolved.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        AuthUser::resolve(&parts.headers, &config)
    }
}
