use std::sync::Arc;

use async_trait::async_trait;
use blitz_auth_core::auth::{
    CallbackOutcome, CallbackParams, ConfigurationError, Result, SignInCallback,
};
use serde_json::{Map, Value};

use super::{Flow, RequestContext, Step};
use crate::response::AuthResponse;

/// Finishes the flow: exchanges the code, hands the result to the host's
/// sign-in callback, then redirects.
pub struct CallbackStep {
    error_redirect_url: String,
    success_redirect_url: String,
    callback: Arc<dyn SignInCallback>,
}

impl CallbackStep {
    pub fn new(
        error_redirect_url: String,
        success_redirect_url: String,
        callback: Arc<dyn SignInCallback>,
    ) -> Self {
        Self {
            error_redirect_url,
            success_redirect_url,
            callback,
        }
    }

    fn fail(&self, ctx: RequestContext, message: &str) -> Flow {
        Flow::Terminate(
            ctx,
            AuthResponse::error_redirect(&self.error_redirect_url, message),
        )
    }
}

/// The parsed body, or `code`/`state` lifted from the query when the
/// provider redirected with a GET.
fn callback_body(ctx: &RequestContext) -> Map<String, Value> {
    if let Some(body) = &ctx.request.body {
        return body.clone();
    }
    ["code", "state"]
        .into_iter()
        .filter_map(|key| {
            ctx.request
                .query
                .get(key)
                .map(|v| (key.to_string(), Value::String(v.clone())))
        })
        .collect()
}

#[async_trait]
impl Step for CallbackStep {
    fn name(&self) -> &'static str {
        "callback"
    }

    async fn run(&self, mut ctx: RequestContext) -> Result<Flow> {
        let params = CallbackParams {
            query: ctx.request.query.clone(),
            body: callback_body(&ctx),
            cookies: ctx.request.cookies.clone(),
            callback_url: ctx.callback_url.clone(),
            secure_cookies: ctx.secure_cookies,
        };

        let exchange = match ctx.provider.exchange(&params).await {
            Ok(exchange) => exchange,
            Err(e) => {
                tracing::error!(provider = ctx.provider.id(), error = %e, "OAuth callback failed");
                let message = e.to_string();
                return Ok(self.fail(ctx, &message));
            }
        };
        ctx.cookies.append(exchange.cookies);

        let session = ctx
            .session
            .as_mut()
            .ok_or(ConfigurationError::MissingSession)?;

        let outcome = self
            .callback
            .on_sign_in(
                &exchange.profile,
                &exchange.account,
                &exchange.raw_profile,
                session,
            )
            .await;

        let redirect = match outcome {
            Ok(CallbackOutcome::Redirect(url)) => url,
            Ok(CallbackOutcome::Default) => self.success_redirect_url.clone(),
            Err(e) => {
                tracing::error!(provider = ctx.provider.id(), error = %e, "Sign-in callback failed");
                let message = e.to_string();
                return Ok(self.fail(ctx, &message));
            }
        };

        tracing::info!(
            provider = ctx.provider.id(),
            user_id = ctx.session.as_ref().and_then(|s| s.user_id()),
            "OAuth sign-in completed"
        );

        let cookies = std::mem::take(&mut ctx.cookies);
        Ok(Flow::Terminate(
            ctx,
            AuthResponse::redirect(redirect).with_cookies(cookies),
        ))
    }
}
