//! Generic OAuth 2.0 authorization-code provider with PKCE.

use async_trait::async_trait;
use blitz_auth_core::auth::{
    Account, Authorization, AuthorizationParams, CallbackParams, CookieOptions, ExchangeResult,
    OAuthProvider, Profile, ProviderError, ResponseCookie,
};
use chrono::Utc;
use oauth2::{
    basic::BasicClient, reqwest::async_http_client, AuthType, AuthUrl, AuthorizationCode,
    ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use reqwest::header::ACCEPT;
use serde_json::Value;
use url::Url;

use super::{
    check_provider_error, clear_flow_cookies, verify_state, FLOW_COOKIE_MAX_AGE, PKCE_COOKIE,
    STATE_COOKIE,
};
use crate::error::AuthError;

/// Maps a provider's raw userinfo response to a [`Profile`].
pub type ProfileMapper = fn(&Value) -> Result<Profile, ProviderError>;

/// Authorization parameters the provider sets itself; never taken from the
/// sign-in query.
const RESERVED_PARAMS: [&str; 7] = [
    "client_id",
    "code_challenge",
    "code_challenge_method",
    "redirect_uri",
    "response_type",
    "scope",
    "state",
];

#[derive(Debug, Clone)]
pub struct OAuth2ProviderConfig {
    pub id: String,
    pub name: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub authorization_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub scopes: Vec<String>,
    pub profile: ProfileMapper,
}

pub struct OAuth2Provider {
    id: String,
    name: String,
    client: BasicClient,
    userinfo_url: Url,
    scopes: Vec<String>,
    profile: ProfileMapper,
    http_client: reqwest::Client,
}

impl OAuth2Provider {
    /// # Errors
    ///
    /// Returns an error if one of the endpoint URLs is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: OAuth2ProviderConfig) -> Result<Self, AuthError> {
        let invalid = |what: &str, e: url::ParseError| {
            AuthError::Config(format!("{} {what} URL is invalid: {e}", config.id))
        };

        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            config.client_secret.clone().map(ClientSecret::new),
            AuthUrl::new(config.authorization_url.clone()).map_err(|e| invalid("authorization", e))?,
            Some(TokenUrl::new(config.token_url.clone()).map_err(|e| invalid("token", e))?),
        )
        .set_auth_type(AuthType::RequestBody);

        let userinfo_url = Url::parse(&config.userinfo_url).map_err(|e| invalid("userinfo", e))?;

        // Build HTTP client without redirect following
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("blitz-auth/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::Http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            id: config.id,
            name: config.name,
            client,
            userinfo_url,
            scopes: config.scopes,
            profile: config.profile,
            http_client,
        })
    }

    /// GitHub OAuth app.
    ///
    /// # Errors
    ///
    /// See [`OAuth2Provider::new`].
    pub fn github(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, AuthError> {
        Self::new(OAuth2ProviderConfig {
            id: "github".to_string(),
            name: "GitHub".to_string(),
            client_id: client_id.into(),
            client_secret: Some(client_secret.into()),
            authorization_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: "https://github.com/login/oauth/access_token".to_string(),
            userinfo_url: "https://api.github.com/user".to_string(),
            scopes: vec!["read:user".to_string(), "user:email".to_string()],
            profile: github_profile,
        })
    }

    /// Google OAuth client.
    ///
    /// # Errors
    ///
    /// See [`OAuth2Provider::new`].
    pub fn google(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, AuthError> {
        Self::new(OAuth2ProviderConfig {
            id: "google".to_string(),
            name: "Google".to_string(),
            client_id: client_id.into(),
            client_secret: Some(client_secret.into()),
            authorization_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ],
            profile: google_profile,
        })
    }

    fn client_for(&self, callback_url: &Url) -> BasicClient {
        self.client
            .clone()
            .set_redirect_uri(RedirectUrl::from_url(callback_url.clone()))
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Value, ProviderError> {
        let response = self
            .http_client
            .get(self.userinfo_url.clone())
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ProviderError::Profile(e.to_string()))?;

        response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Profile(e.to_string()))
    }
}

#[async_trait]
impl OAuthProvider for OAuth2Provider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn authorization_url(
        &self,
        params: &AuthorizationParams,
    ) -> Result<Authorization, ProviderError> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let client = self.client_for(&params.callback_url);

        let mut request = client.authorize_url(CsrfToken::new_random);
        for scope in &self.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }
        for (name, value) in &params.query {
            if !RESERVED_PARAMS.contains(&name.as_str()) {
                request = request.add_extra_param(name.as_str(), value.as_str());
            }
        }
        let (redirect, state) = request.set_pkce_challenge(pkce_challenge).url();

        let options = CookieOptions::flow(params.secure_cookies).with_max_age(FLOW_COOKIE_MAX_AGE);
        Ok(Authorization {
            redirect,
            cookies: vec![
                ResponseCookie::new(STATE_COOKIE, state.secret().clone(), options.clone()),
                ResponseCookie::new(PKCE_COOKIE, pkce_verifier.secret().clone(), options),
            ],
        })
    }

    async fn exchange(&self, params: &CallbackParams) -> Result<ExchangeResult, ProviderError> {
        check_provider_error(params)?;
        verify_state(params)?;

        let code = params.param("code").ok_or(ProviderError::MissingCode)?;
        let verifier = params
            .cookies
            .get(PKCE_COOKIE)
            .ok_or(ProviderError::MissingVerifier)?;

        let client = self.client_for(&params.callback_url);
        let token = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(verifier.clone()))
            .request_async(async_http_client)
            .await
            .map_err(|e| ProviderError::Exchange(e.to_string()))?;

        let raw_profile = self.fetch_profile(token.access_token().secret()).await?;
        let profile = (self.profile)(&raw_profile)?;

        let mut account = Account::oauth(&self.id, &profile.id);
        account.access_token = Some(token.access_token().secret().clone());
        account.token_type = serde_json::to_value(token.token_type())
            .ok()
            .and_then(|v| v.as_str().map(str::to_string));
        account.refresh_token = token.refresh_token().map(|t| t.secret().clone());
        account.expires_at = token.expires_in().map(|ttl| {
            let seconds = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
            Utc::now().timestamp().saturating_add(seconds)
        });
        account.scope = token.scopes().map(|scopes| {
            scopes
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        });

        tracing::debug!(provider = %self.id, profile_id = %profile.id, "Exchanged authorization code");

        Ok(ExchangeResult {
            profile,
            account,
            raw_profile,
            cookies: clear_flow_cookies(params.secure_cookies),
        })
    }
}

/// Read a string or numeric id field.
fn id_field(raw: &Value, field: &str) -> Result<String, ProviderError> {
    match &raw[field] {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(ProviderError::Profile(format!("missing `{field}` in profile"))),
    }
}

fn str_field(raw: &Value, field: &str) -> Option<String> {
    raw[field].as_str().map(str::to_string)
}

/// Profile from `GET https://api.github.com/user`.
pub fn github_profile(raw: &Value) -> Result<Profile, ProviderError> {
    Ok(Profile {
        id: id_field(raw, "id")?,
        name: str_field(raw, "name").or_else(|| str_field(raw, "login")),
        email: str_field(raw, "email"),
        image: str_field(raw, "avatar_url"),
    })
}

/// Profile from the OpenID Connect userinfo endpoint.
pub fn google_profile(raw: &Value) -> Result<Profile, ProviderError> {
    Ok(Profile {
        id: id_field(raw, "sub")?,
        name: str_field(raw, "name"),
        email: str_field(raw, "email"),
        image: str_field(raw, "picture"),
    })
}
