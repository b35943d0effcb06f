//! Built-in `OAuthProvider` implementations.
//!
//! - `OAuth2Provider`: authorization code + PKCE, with GitHub and Google presets
//! - `MockProvider` (feature `mock`): no network, for local development

#[cfg(feature = "mock")]
mod mock;
mod oauth;

#[cfg(feature = "mock")]
pub use mock::MockProvider;
pub use oauth::{OAuth2Provider, OAuth2ProviderConfig, ProfileMapper};

use blitz_auth_core::auth::{CallbackParams, CookieSet, ProviderError, ResponseCookie};

/// Cookie carrying the OAuth `state` between sign-in and callback.
pub const STATE_COOKIE: &str = "blitz-auth.state";

/// Cookie carrying the PKCE code verifier between sign-in and callback.
pub const PKCE_COOKIE: &str = "blitz-auth.pkce.code_verifier";

/// Lifetime of the flow cookies, in seconds.
pub const FLOW_COOKIE_MAX_AGE: i64 = 15 * 60;

/// Fail if the provider reported an error on the redirect.
fn check_provider_error(params: &CallbackParams) -> Result<(), ProviderError> {
    match params.param("error") {
        Some(error) => {
            let message = match params.param("error_description") {
                Some(description) => format!("{error}: {description}"),
                None => error.to_string(),
            };
            Err(ProviderError::Exchange(message))
        }
        None => Ok(()),
    }
}

/// Compare the returned `state` with the one stored at sign-in.
fn verify_state(params: &CallbackParams) -> Result<(), ProviderError> {
    match (params.param("state"), params.cookies.get(STATE_COOKIE)) {
        (Some(returned), Some(stored)) if returned == stored => Ok(()),
        _ => Err(ProviderError::InvalidState),
    }
}

fn clear_flow_cookies(secure: bool) -> CookieSet {
    [STATE_COOKIE, PKCE_COOKIE]
        .into_iter()
        .map(|name| ResponseCookie::expired(name, secure))
        .collect()
}
