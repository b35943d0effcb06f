//! Landing page.

use askama::Template;
use axum::{extract::Query, response::IntoResponse};
use blitz_auth::OptionalSession;
use blitz_auth_core::auth::SessionData;
use serde::Deserialize;

use super::HtmlTemplate;

#[derive(Deserialize, Default)]
pub struct IndexQuery {
    pub welcome: Option<String>,
}

/// What the landing page shows about the signed-in user.
struct SignedInUser {
    name: String,
    email: String,
    provider: String,
}

impl SignedInUser {
    fn from_session(session: &SessionData) -> Self {
        let field = |key: &str| {
            session
                .public_data
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Self {
            name: field("name"),
            email: field("email"),
            provider: field("provider"),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    user: Option<SignedInUser>,
    welcome: bool,
}

/// Handler for GET /
pub async fn index(
    OptionalSession(session): OptionalSession,
    Query(query): Query<IndexQuery>,
) -> impl IntoResponse {
    let user = session
        .filter(|s| s.user_id.is_some())
        .map(|s| SignedInUser::from_session(&s));

    HtmlTemplate(IndexTemplate {
        user,
        welcome: query.welcome.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_in_page_escapes_profile_fields() {
        let page = IndexTemplate {
            user: Some(SignedInUser {
                name: "<Ada>".to_string(),
                email: "ada@example.com".to_string(),
                provider: "github".to_string(),
            }),
            welcome: true,
        }
        .render()
        .unwrap();

        assert!(page.contains("Hello, &lt;Ada&gt;"));
        assert!(page.contains("Welcome! Your account has been created."));
        assert!(page.contains(r#"action="/logout""#));
    }

    #[test]
    fn anonymous_page_links_to_login() {
        let page = IndexTemplate {
            user: None,
            welcome: false,
        }
        .render()
        .unwrap();

        assert!(page.contains("You are not signed in."));
        assert!(!page.contains("Welcome!"));
    }
}
