//! Mock OAuth provider for development and testing.
//!
//! Sign-in skips the identity provider entirely: the authorization URL points
//! straight back to the callback with a code that embeds the user as
//! base64-encoded JSON.

use async_trait::async_trait;
use base64::Engine;
use blitz_auth_core::auth::{
    Account, Authorization, AuthorizationParams, CallbackParams, CookieOptions, ExchangeResult,
    OAuthProvider, Profile, ProviderError, ResponseCookie,
};
use oauth2::CsrfToken;
use serde_json::{json, Value};

use super::{check_provider_error, clear_flow_cookies, verify_state, FLOW_COOKIE_MAX_AGE, STATE_COOKIE};

pub struct MockProvider {
    id: String,
    user: Profile,
}

impl MockProvider {
    /// A mock provider registered as `id` that signs everyone in as `user`.
    pub fn new(id: impl Into<String>, user: Profile) -> Self {
        Self {
            id: id.into(),
            user,
        }
    }

    fn encode_code(&self) -> String {
        let claims = json!({
            "sub": self.user.id,
            "name": self.user.name,
            "email": self.user.email,
            "image": self.user.image,
        });
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(
            "mock",
            Profile {
                id: "mock-user".to_string(),
                name: Some("Mock User".to_string()),
                email: Some("mock@example.com".to_string()),
                image: None,
            },
        )
    }
}

#[async_trait]
impl OAuthProvider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Mock"
    }

    async fn authorization_url(
        &self,
        params: &AuthorizationParams,
    ) -> Result<Authorization, ProviderError> {
        let state = CsrfToken::new_random().secret().clone();

        let mut redirect = params.callback_url.clone();
        redirect
            .query_pairs_mut()
            .append_pair("code", &self.encode_code())
            .append_pair("state", &state);

        Ok(Authorization {
            redirect,
            cookies: vec![ResponseCookie::new(
                STATE_COOKIE,
                state,
                CookieOptions::flow(params.secure_cookies).with_max_age(FLOW_COOKIE_MAX_AGE),
            )],
        })
    }

    async fn exchange(&self, params: &CallbackParams) -> Result<ExchangeResult, ProviderError> {
        check_provider_error(params)?;
        verify_state(params)?;

        let code = params.param("code").ok_or(ProviderError::MissingCode)?;
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(code)
            .map_err(|e| ProviderError::Exchange(e.to_string()))?;
        let raw_profile: Value =
            serde_json::from_slice(&decoded).map_err(|e| ProviderError::Exchange(e.to_string()))?;

        let profile = Profile {
            id: raw_profile["sub"]
                .as_str()
                .ok_or_else(|| ProviderError::Exchange("Invalid mock code".to_string()))?
                .to_string(),
            name: raw_profile["name"].as_str().map(String::from),
            email: raw_profile["email"].as_str().map(String::from),
            image: raw_profile["image"].as_str().map(String::from),
        };

        Ok(ExchangeResult {
            account: Account::oauth(&self.id, &profile.id),
            profile,
            raw_profile,
            cookies: clear_flow_cookies(params.secure_cookies),
        })
    }
}
