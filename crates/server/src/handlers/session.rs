//! Session endpoints outside the OAuth flow.

use axum::{extract::State, response::IntoResponse, Json};
use blitz_auth::{AuthResponse, CurrentSession};
use blitz_auth_core::auth::{CookieSet, ResponseCookie, SessionData};

use crate::state::AppState;

/// Handler for POST /logout: clears the session cookie.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let settings = &state.auth.config.settings;

    let mut cookies = CookieSet::new();
    cookies.push(ResponseCookie::expired(
        settings.session_cookie_name.clone(),
        settings.is_production(),
    ));

    AuthResponse::redirect("/").with_cookies(cookies)
}

/// Handler for GET /me: the signed-in session, or 401.
pub async fn me(CurrentSession(session): CurrentSession) -> Json<SessionData> {
    Json(session)
}
