use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::middleware::{session_token, AdminSession, SESSION_COOKIE};
use crate::auth::models::{AdminUser, LoginRequest, LoginResponse};
use crate::error::AppError;

/// `POST /api/auth/login`
///
/// Checks the configured admin credentials. On success, sets the session
/// cookie and returns the token for API clients.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    if let Err(e) = state.admin.verify(&req.email, &req.password) {
        tracing::warn!("Rejected admin login for '{}'", req.email);
        return Err(e);
    }

    let email = state.admin.email.clone();
    let token = state.sessions.create(&email)?;
    tracing::info!("Admin '{}' logged in", email);

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(state.sessions.ttl().num_seconds()))
        .build();

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: "Logged in".to_string(),
            admin: AdminUser { email },
            token,
        }),
    ))
}

/// `GET /api/auth/me`
pub async fn me_handler(session: AdminSession) -> Json<AdminUser> {
    Json(session.admin)
}

/// `POST /api/auth/logout` — Ends the session, if any, and clears the cookie.
pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), AppError> {
    if let Some(token) = session_token(&headers) {
        state.sessions.revoke(&token)?;
    }

    let cookie = Cookie::build((SESSION_COOKIE, "")).path("/").removal().build();

    Ok((jar.remove(cookie), Json(json!({ "message": "Logged out" }))))
}
