//! Stub collaborators shared by the unit tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use blitz_auth_core::auth::{
    Account, Authorization, AuthorizationParams, BoxError, CallbackOutcome, CallbackParams,
    CookieOptions, CookieSet, ExchangeResult, NormalizedRequest, OAuthProvider, Profile,
    ProviderError, ResponseCookie, SessionContext, SignInCallback,
};
use serde_json::{json, Value};
use url::Url;

use crate::chain::RequestContext;

pub struct StubProvider {
    id: String,
    failure: Option<String>,
}

impl StubProvider {
    pub fn ok(id: &str) -> Self {
        Self {
            id: id.to_string(),
            failure: None,
        }
    }

    pub fn failing(id: &str, message: &str) -> Self {
        Self {
            id: id.to_string(),
            failure: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl OAuthProvider for StubProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Stub"
    }

    async fn authorization_url(
        &self,
        params: &AuthorizationParams,
    ) -> Result<Authorization, ProviderError> {
        if let Some(message) = &self.failure {
            return Err(ProviderError::Exchange(message.clone()));
        }
        let mut redirect = Url::parse("https://provider.test/authorize").unwrap();
        redirect
            .query_pairs_mut()
            .append_pair("state", "stub-state")
            .append_pair("redirect_uri", params.callback_url.as_str());

        Ok(Authorization {
            redirect,
            cookies: vec![ResponseCookie::new(
                "blitz-auth.state",
                "stub-state",
                CookieOptions::flow(params.secure_cookies).with_max_age(900),
            )],
        })
    }

    async fn exchange(&self, params: &CallbackParams) -> Result<ExchangeResult, ProviderError> {
        if let Some(message) = &self.failure {
            return Err(ProviderError::Exchange(message.clone()));
        }
        let code = params.param("code").ok_or(ProviderError::MissingCode)?;

        let mut cookies = CookieSet::new();
        cookies.push(ResponseCookie::expired(
            "blitz-auth.state",
            params.secure_cookies,
        ));

        Ok(ExchangeResult {
            profile: Profile {
                id: "42".to_string(),
                name: Some("Stub User".to_string()),
                email: Some("stub@example.com".to_string()),
                image: None,
            },
            account: Account::oauth(&self.id, "42"),
            raw_profile: json!({ "id": 42, "code": code }),
            cookies,
        })
    }
}

#[derive(Default)]
pub struct StubCallback {
    redirect: Option<String>,
    failure: Option<String>,
}

impl StubCallback {
    pub fn redirecting(url: &str) -> Self {
        Self {
            redirect: Some(url.to_string()),
            failure: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            redirect: None,
            failure: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl SignInCallback for StubCallback {
    async fn on_sign_in(
        &self,
        _profile: &Profile,
        _account: &Account,
        _raw_profile: &Value,
        session: &mut SessionContext,
    ) -> Result<CallbackOutcome, BoxError> {
        if let Some(message) = &self.failure {
            return Err(message.clone().into());
        }
        session.create("stub-user", [("role".to_string(), json!("USER"))]);
        Ok(self
            .redirect
            .clone()
            .map(CallbackOutcome::Redirect)
            .unwrap_or_default())
    }
}

fn build(path: &str, headers: BTreeMap<String, String>, provider: StubProvider) -> RequestContext {
    build_with_cookies(path, headers, BTreeMap::new(), provider)
}

fn build_with_cookies(
    path: &str,
    headers: BTreeMap<String, String>,
    cookies: BTreeMap<String, String>,
    provider: StubProvider,
) -> RequestContext {
    let mut request =
        NormalizedRequest::new(&format!("http://localhost:3000{path}"), "GET", headers, None)
            .unwrap();
    request.cookies = cookies;
    let callback_url = Url::parse(&format!(
        "http://localhost:3000/api/auth/callback/{}",
        provider.id
    ))
    .unwrap();
    RequestContext::new(request, Arc::new(provider), callback_url, "http", false)
}

/// A context for `path` on `localhost:3000` with a working `github` stub.
pub fn context(path: &str) -> RequestContext {
    build(path, BTreeMap::new(), StubProvider::ok("github"))
}

pub fn with_provider(path: &str, provider: StubProvider) -> RequestContext {
    build(path, BTreeMap::new(), provider)
}

pub fn context_with_header(path: &str, name: &str, value: &str) -> RequestContext {
    let headers = BTreeMap::from([(name.to_ascii_lowercase(), value.to_string())]);
    build(path, headers, StubProvider::ok("github"))
}

pub fn context_with_cookie(path: &str, name: &str, value: &str) -> RequestContext {
    let headers = BTreeMap::from([("cookie".to_string(), format!("{name}={value}"))]);
    let cookies = BTreeMap::from([(name.to_string(), value.to_string())]);
    build_with_cookies(path, headers, cookies, StubProvider::ok("github"))
}
