use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. Ownership
/// checks happen against `user_id` in the handler body.
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub name: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let token = bearer_token(parts).ok_or(AppError::TokenMissing)?;
        let claims =
            jwt::verify(token, &app.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: claims.uid,
            email: claims.sub,
            name: claims.name,
        })
    }
}

/// Caller identity for artifact downloads, resolved through two strategies
/// in order:
///
/// 1. the usual `Authorization: Bearer <token>` header;
/// 2. a raw JWT carried as the whole query string
///    (`...?<header>.<payload>.<signature>`), used by link-sharing clients
///    that cannot set headers.
///
/// Neither yielding an identity is `TOKEN_MISSING`; a present but bad header
/// token is `TOKEN_INVALID`.
pub struct DownloadUser {
    pub user_id: i32,
    pub name: String,
}

impl<S> FromRequestParts<S> for DownloadUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let secret = &app.config.auth.jwt_secret;

        if let Some(token) = bearer_token(parts) {
            let claims = jwt::verify(token, secret).map_err(|_| AppError::TokenInvalid)?;
            return Ok(DownloadUser {
                user_id: claims.uid,
                name: claims.name,
            });
        }

        if let Some(token) = url_token(parts.uri.query()) {
            if let Ok(claims) = jwt::verify(token, secret) {
                return Ok(DownloadUser {
                    user_id: claims.uid,
                    name: claims.name,
                });
            }
            tracing::debug!("URL-embedded token failed verification");
        }

        Err(AppError::TokenMissing)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Accept the query string as a token only when it has the three
/// dot-delimited segments of a compact JWT.
fn url_token(query: Option<&str>) -> Option<&str> {
    let query = query?;
    if !query.is_empty() && query.split('.').count() == 3 && !query.contains('=') {
        Some(query)
    } else {
        None
    }
}
