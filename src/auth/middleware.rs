use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;

use crate::app::AppState;
use crate::auth::models::AdminUser;
use crate::error::AppError;

/// Name of the cookie carrying the admin session token.
pub const SESSION_COOKIE: &str = "site_admin_session";

/// Extractor for handlers that require the admin to be logged in.
///
/// The session token is read from `Authorization: Bearer` first, then from
/// the session cookie.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub admin: AdminUser,
    pub token: String,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or_else(|| AppError::Auth("Not logged in".into()))?;
        let email = state.sessions.validate(&token)?;

        Ok(AdminSession {
            admin: AdminUser { email },
            token,
        })
    }
}

/// Find the session token in the request headers, if any.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match bearer {
        Some(token) => Some(token.to_string()),
        None => CookieJar::from_headers(headers)
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty()),
    }
}
