//! Terminal responses produced by the chain and their wire form.

use axum::{
    http::{
        header::{LOCATION, SET_COOKIE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, SameSite as CookieSameSite};
use blitz_auth_core::auth::{error_redirect_url, CookieSet, ResponseCookie, SameSite};

/// A response the chain ends with. Cookies are serialized once, when the
/// response is converted for axum.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub cookies: CookieSet,
    pub body: Option<serde_json::Value>,
}

impl AuthResponse {
    /// `302 Found` to `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FOUND,
            location: Some(location.into()),
            cookies: CookieSet::new(),
            body: None,
        }
    }

    /// `302 Found` to the error page, carrying `message` as `authError`.
    pub fn error_redirect(error_page: &str, message: &str) -> Self {
        Self::redirect(error_redirect_url(error_page, message))
    }

    pub fn json(status: StatusCode, body: serde_json::Value) -> Self {
        Self {
            status,
            location: None,
            cookies: CookieSet::new(),
            body: Some(body),
        }
    }

    pub fn with_cookies(mut self, cookies: CookieSet) -> Self {
        self.cookies.append(cookies);
        self
    }

    /// One `Set-Cookie` value per distinct cookie name.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.cookies
            .effective()
            .into_iter()
            .map(serialize_cookie)
            .collect()
    }
}

/// Render a cookie as a `Set-Cookie` header value, percent-encoding the value.
pub fn serialize_cookie(cookie: &ResponseCookie) -> String {
    let options = &cookie.options;
    let mut builder = Cookie::build((cookie.name.clone(), cookie.value.clone()))
        .http_only(options.http_only)
        .secure(options.secure);

    if let Some(path) = &options.path {
        builder = builder.path(path.clone());
    }
    if let Some(domain) = &options.domain {
        builder = builder.domain(domain.clone());
    }
    if let Some(max_age) = options.max_age {
        builder = builder.max_age(time::Duration::seconds(max_age));
    }
    if let Some(same_site) = options.same_site {
        builder = builder.same_site(match same_site {
            SameSite::Strict => CookieSameSite::Strict,
            SameSite::Lax => CookieSameSite::Lax,
            SameSite::None => CookieSameSite::None,
        });
    }

    builder.build().encoded().to_string()
}

impl IntoResponse for AuthResponse {
    fn into_response(self) -> Response {
        let set_cookies = self.set_cookie_headers();

        let mut response = match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        };

        let headers = response.headers_mut();
        if let Some(location) = &self.location {
            match HeaderValue::from_str(location) {
                Ok(value) => {
                    headers.insert(LOCATION, value);
                }
                Err(e) => {
                    tracing::error!(location = %location, error = %e, "Invalid redirect location");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            }
        }
        for cookie in set_cookies {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(e) => tracing::error!(error = %e, "Dropping unrepresentable cookie header"),
            }
        }

        response
    }
}
