use async_trait::async_trait;
use blitz_auth_core::auth::{
    AuthorizationParams, ConfigurationError, Result, INTERNAL_REDIRECT_URL_KEY,
};
use serde_json::Value;

use super::{Flow, RequestContext, Step};
use crate::response::AuthResponse;

/// Sends the browser to the provider's authorization page.
pub struct SignInStep {
    error_redirect_url: String,
}

impl SignInStep {
    pub fn new(error_redirect_url: String) -> Self {
        Self { error_redirect_url }
    }
}

#[async_trait]
impl Step for SignInStep {
    fn name(&self) -> &'static str {
        "signin"
    }

    async fn run(&self, mut ctx: RequestContext) -> Result<Flow> {
        let params = AuthorizationParams {
            query: ctx.request.query.clone(),
            callback_url: ctx.callback_url.clone(),
            secure_cookies: ctx.secure_cookies,
        };

        let authorization = match ctx.provider.authorization_url(&params).await {
            Ok(authorization) => authorization,
            Err(e) => {
                tracing::error!(provider = ctx.provider.id(), error = %e, "OAuth sign-in failed");
                let response = AuthResponse::error_redirect(&self.error_redirect_url, &e.to_string());
                return Ok(Flow::Terminate(ctx, response));
            }
        };

        ctx.cookies.extend(authorization.cookies);

        let redirect = authorization.redirect.to_string();
        ctx.session
            .as_mut()
            .ok_or(ConfigurationError::MissingSession)?
            .set_public_data([(
                INTERNAL_REDIRECT_URL_KEY.to_string(),
                Value::String(redirect.clone()),
            )]);

        let cookies = std::mem::take(&mut ctx.cookies);
        tracing::debug!(provider = ctx.provider.id(), "Redirecting to provider");
        Ok(Flow::Terminate(
            ctx,
            AuthResponse::redirect(redirect).with_cookies(cookies),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context, with_provider, StubProvider};
    use axum::http::StatusCode;
    use blitz_auth_core::auth::{AuthError, SessionContext};

    fn step() -> SignInStep {
        SignInStep::new("/login".to_string())
    }

    #[tokio::test]
    async fn redirects_to_provider_and_records_target() {
        let mut ctx = context("/api/auth/signin/github");
        ctx.session = Some(SessionContext::new());

        let Flow::Terminate(ctx, response) = step().run(ctx).await.unwrap() else {
            panic!("signin must terminate");
        };

        assert_eq!(response.status, StatusCode::FOUND);
        let location = response.location.clone().unwrap();
        assert!(location.starts_with("https://provider.test/authorize"));

        let session = ctx.session.unwrap();
        assert!(session.is_dirty());
        assert_eq!(
            session.get(INTERNAL_REDIRECT_URL_KEY),
            Some(&Value::String(location))
        );
        assert!(response
            .cookies
            .iter()
            .any(|c| c.name == "blitz-auth.state"));
    }

    #[tokio::test]
    async fn provider_failure_redirects_to_error_page() {
        let mut ctx = with_provider(
            "/api/auth/signin/github",
            StubProvider::failing("github", "provider is down"),
        );
        ctx.session = Some(SessionContext::new());

        let Flow::Terminate(ctx, response) = step().run(ctx).await.unwrap() else {
            panic!("signin must terminate");
        };

        assert_eq!(
            response.location.as_deref(),
            Some("/login?authError=provider%20is%20down")
        );
        assert!(!ctx.session.unwrap().is_dirty());
    }

    #[tokio::test]
    async fn missing_session_is_a_configuration_error() {
        let result = step().run(context("/api/auth/signin/github")).await;
        assert!(matches!(
            result,
            Err(AuthError::Configuration(ConfigurationError::MissingSession))
        ));
    }
}
