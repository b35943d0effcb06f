//! The per-request middleware chain.
//!
//! A chain is an ordered list of [`Step`]s. Each step receives the request
//! context by value and either hands it on ([`Flow::Continue`]) or ends the
//! request with a response ([`Flow::Terminate`]). [`run_chain`] drives the
//! steps and commits the session once a step terminates.

mod callback;
mod proxy;
mod session;
mod signin;

use std::sync::Arc;

use async_trait::async_trait;
use blitz_auth_core::auth::{
    AuthAction, ConfigurationError, CookieSet, NormalizedRequest, OAuthProvider, Result,
    SessionContext,
};
use url::Url;

use crate::config::AuthConfig;
use crate::response::AuthResponse;

pub use callback::CallbackStep;
pub use proxy::SecureProxyStep;
pub use session::{CookieSessionStep, SessionCodec};
pub use signin::SignInStep;

/// Everything a step may read or update while a request is in flight.
pub struct RequestContext {
    pub request: Arc<NormalizedRequest>,
    pub provider: Arc<dyn OAuthProvider>,
    /// Where the provider sends the user back to.
    pub callback_url: Url,
    /// Effective protocol of the client connection (`http` or `https`).
    pub protocol: String,
    /// Whether cookies set for this request carry `Secure`.
    pub secure_cookies: bool,
    pub session: Option<SessionContext>,
    pub cookies: CookieSet,
    session_codec: Option<SessionCodec>,
}

impl RequestContext {
    pub fn new(
        request: NormalizedRequest,
        provider: Arc<dyn OAuthProvider>,
        callback_url: Url,
        protocol: impl Into<String>,
        secure_cookies: bool,
    ) -> Self {
        Self {
            request: Arc::new(request),
            provider,
            callback_url,
            protocol: protocol.into(),
            secure_cookies,
            session: None,
            cookies: CookieSet::new(),
            session_codec: None,
        }
    }

    /// Write the session back into `response` if a step changed it.
    fn finish(self, mut response: AuthResponse) -> Result<AuthResponse> {
        if let (Some(codec), Some(session)) = (&self.session_codec, &self.session) {
            codec.commit(session, &self.protocol, &mut response.cookies)?;
        }
        Ok(response)
    }
}

/// Outcome of a single step.
pub enum Flow {
    Continue(RequestContext),
    Terminate(RequestContext, AuthResponse),
}

#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Only fatal wiring problems are returned as errors. OAuth failures are
    /// turned into error redirects by the steps themselves.
    async fn run(&self, ctx: RequestContext) -> Result<Flow>;
}

/// Run `steps` in order until one terminates.
///
/// # Errors
///
/// Propagates step errors, session commit failures, and a chain that ends
/// without any step terminating.
pub async fn run_chain(steps: &[Box<dyn Step>], ctx: RequestContext) -> Result<AuthResponse> {
    let mut ctx = ctx;
    for step in steps {
        tracing::debug!(step = step.name(), "Running auth step");
        match step.run(ctx).await? {
            Flow::Continue(next) => ctx = next,
            Flow::Terminate(ctx, response) => return ctx.finish(response),
        }
    }
    Err(ConfigurationError::Invalid(
        "middleware chain finished without a response".to_string(),
    )
    .into())
}

/// Assemble the chain for `action`: cookie session first, then the optional
/// secure-proxy step, then exactly one action step.
pub fn build_chain(config: &AuthConfig, action: AuthAction, secure: bool) -> Vec<Box<dyn Step>> {
    let settings = &config.settings;
    let mut steps: Vec<Box<dyn Step>> = vec![Box::new(CookieSessionStep::new(
        SessionCodec::new(settings, secure),
    ))];

    if settings.secure_proxy {
        steps.push(Box::new(SecureProxyStep));
    }

    match action {
        AuthAction::SignIn => steps.push(Box::new(SignInStep::new(
            settings.error_redirect_url.clone(),
        ))),
        AuthAction::Callback => steps.push(Box::new(CallbackStep::new(
            settings.error_redirect_url.clone(),
            settings.success_redirect_url.clone(),
            config.callback(),
        ))),
    }

    steps
}
