use async_trait::async_trait;
use blitz_auth_core::auth::{forwarded_protocol, Result};

use super::{Flow, RequestContext, Step};

/// Takes the client protocol from `X-Forwarded-Proto`, for deployments
/// behind a TLS-terminating proxy.
pub struct SecureProxyStep;

#[async_trait]
impl Step for SecureProxyStep {
    fn name(&self) -> &'static str {
        "secure-proxy"
    }

    async fn run(&self, mut ctx: RequestContext) -> Result<Flow> {
        ctx.protocol = forwarded_protocol(ctx.request.header("x-forwarded-proto"));
        Ok(Flow::Continue(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context_with_header;

    async fn protocol_for(header: Option<&str>) -> String {
        let ctx = match header {
            Some(value) => {
                context_with_header("/api/auth/signin/github", "x-forwarded-proto", value)
            }
            None => crate::test_support::context("/api/auth/signin/github"),
        };
        match SecureProxyStep.run(ctx).await.unwrap() {
            Flow::Continue(ctx) => ctx.protocol,
            Flow::Terminate(..) => panic!("secure-proxy must not terminate"),
        }
    }

    #[tokio::test]
    async fn trusts_forwarded_proto() {
        assert_eq!(protocol_for(Some("https")).await, "https");
        assert_eq!(protocol_for(Some("https, http")).await, "https");
        assert_eq!(protocol_for(Some("http")).await, "http");
    }

    #[tokio::test]
    async fn falls_back_to_http() {
        assert_eq!(protocol_for(None).await, "http");
    }
}
