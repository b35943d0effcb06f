use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use super::{CookieSet, NormalizationError};

/// The two OAuth sub-flows the adapter serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthAction {
    SignIn,
    Callback,
}

impl AuthAction {
    /// Supported actions, in detection order.
    pub const ALL: [AuthAction; 2] = [AuthAction::SignIn, AuthAction::Callback];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignIn => "signin",
            Self::Callback => "callback",
        }
    }
}

impl std::fmt::Display for AuthAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthAction {
    type Err = NormalizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signin" => Ok(Self::SignIn),
            "callback" => Ok(Self::Callback),
            other => Err(NormalizationError(format!("Unsupported action: {other}"))),
        }
    }
}

/// `SameSite` attribute of a response cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// Attributes of a cookie the adapter asks the browser to store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CookieOptions {
    pub path: Option<String>,
    pub domain: Option<String>,
    /// Lifetime in seconds. `Some(0)` expires the cookie immediately.
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    /// `HttpOnly; SameSite=Lax; Path=/`, the attributes of every flow cookie.
    pub fn flow(secure: bool) -> Self {
        Self {
            path: Some("/".to_string()),
            domain: None,
            max_age: None,
            http_only: true,
            secure,
            same_site: Some(SameSite::Lax),
        }
    }

    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }
}

/// A `{name, value, options}` triple destined for a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCookie {
    pub name: String,
    pub value: String,
    pub options: CookieOptions,
}

impl ResponseCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            options,
        }
    }

    /// A cookie that clears `name` on the client.
    pub fn expired(name: impl Into<String>, secure: bool) -> Self {
        Self::new(name, "", CookieOptions::flow(secure).with_max_age(0))
    }
}

/// Normalized user profile produced by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

/// The provider account linked by a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub provider: String,
    pub provider_account_id: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub refresh_token: Option<String>,
    /// Absolute expiry as a unix timestamp in seconds.
    pub expires_at: Option<i64>,
    pub scope: Option<String>,
}

impl Account {
    pub fn oauth(provider: impl Into<String>, provider_account_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            provider_account_id: provider_account_id.into(),
            account_type: "oauth".to_string(),
            access_token: None,
            token_type: None,
            refresh_token: None,
            expires_at: None,
            scope: None,
        }
    }
}

/// Input of the authorization-URL builder.
#[derive(Debug, Clone)]
pub struct AuthorizationParams {
    pub query: BTreeMap<String, String>,
    /// Where the provider must send the user back to.
    pub callback_url: Url,
    /// Whether flow cookies should carry the `Secure` attribute.
    pub secure_cookies: bool,
}

/// Result of the authorization-URL builder.
#[derive(Debug, Clone)]
pub struct Authorization {
    pub redirect: Url,
    pub cookies: Vec<ResponseCookie>,
}

/// Input of the code exchange.
#[derive(Debug, Clone)]
pub struct CallbackParams {
    pub query: BTreeMap<String, String>,
    pub body: Map<String, Value>,
    pub cookies: BTreeMap<String, String>,
    pub callback_url: Url,
    pub secure_cookies: bool,
}

impl CallbackParams {
    /// Looks a parameter up in the body first, then in the query.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.body
            .get(name)
            .and_then(Value::as_str)
            .or_else(|| self.query.get(name).map(String::as_str))
    }
}

/// Result of the code exchange.
#[derive(Debug, Clone)]
pub struct ExchangeResult {
    pub profile: Profile,
    pub account: Account,
    pub raw_profile: Value,
    /// Cookies the provider wants set or cleared once the exchange is done.
    pub cookies: CookieSet,
}

/// What the host's sign-in callback decided.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CallbackOutcome {
    /// Redirect to the configured success URL.
    #[default]
    Default,
    Redirect(String),
}

impl From<String> for CallbackOutcome {
    fn from(url: String) -> Self {
        Self::Redirect(url)
    }
}

impl From<&str> for CallbackOutcome {
    fn from(url: &str) -> Self {
        Self::Redirect(url.to_string())
    }
}
