//! Axum extractors for the session cookie.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use axum_extra::extract::CookieJar;
use blitz_auth_core::auth::SessionData;

use crate::AuthState;

fn read_session(parts: &Parts, auth_state: &AuthState) -> Option<SessionData> {
    let codec = auth_state.session_reader();
    let jar = CookieJar::from_headers(&parts.headers);
    let cookie = jar.get(codec.cookie_name())?;
    codec.decode(cookie.value())
}

/// Extractor for a signed-in session. Returns 401 without one.
pub struct CurrentSession(pub SessionData);

impl<S> FromRequestParts<S> for CurrentSession
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let session =
            read_session(parts, &auth_state).ok_or((StatusCode::UNAUTHORIZED, "No session"))?;

        if session.user_id.is_none() {
            return Err((StatusCode::UNAUTHORIZED, "Not signed in"));
        }

        Ok(CurrentSession(session))
    }
}

/// Extractor for an optional session. Anonymous and invalid cookies give `None`.
pub struct OptionalSession(pub Option<SessionData>);

impl<S> FromRequestParts<S> for OptionalSession
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        Ok(OptionalSession(read_session(parts, &auth_state)))
    }
}
