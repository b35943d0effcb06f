//! Login page handler.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use blitz_auth::OptionalSession;
use serde::Deserialize;

use super::HtmlTemplate;
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct LoginQuery {
    /// Set by the adapter when a sign-in attempt failed.
    #[serde(rename = "authError")]
    pub auth_error: Option<String>,
}

struct ProviderLink {
    id: String,
    name: String,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    error: Option<String>,
    providers: Vec<ProviderLink>,
}

/// Handler for GET /login
///
/// - Unauthenticated: renders one button per configured provider
/// - Authenticated: redirects to `/`
pub async fn login_page(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    Query(query): Query<LoginQuery>,
) -> Response {
    if session.is_some_and(|s| s.user_id.is_some()) {
        return Redirect::to("/").into_response();
    }

    let providers = state
        .auth
        .config
        .providers()
        .iter()
        .map(|p| ProviderLink {
            id: p.id().to_string(),
            name: p.name().to_string(),
        })
        .collect();

    HtmlTemplate(LoginTemplate {
        error: query.auth_error,
        providers,
    })
    .into_response()
}
