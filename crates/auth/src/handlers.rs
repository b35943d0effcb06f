//! HTTP entry point of the adapter.

use axum::{
    extract::{
        rejection::{MatchedPathRejection, RawPathParamsRejection},
        MatchedPath, OriginalUri, RawPathParams, State,
    },
    http::{header::HOST, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use blitz_auth_core::auth::{
    dispatch, is_localhost, resolve_request_url, AuthAction, AuthError as CoreError,
    AuthRouteParam,
};
use serde_json::json;
use url::Url;

use crate::chain::{build_chain, run_chain, RequestContext};
use crate::error::AuthError;
use crate::normalize::{to_internal_request, RequestBody};
use crate::response::AuthResponse;
use crate::AuthState;

/// Route the adapter is mounted on. The parameter must be a catch-all.
pub const AUTH_ROUTE: &str = "/api/auth/{*auth}";

const SERVER_CONFIGURATION_MESSAGE: &str =
    "There is a problem with the server configuration. Check the server logs for more information.";

/// Creates the auth router.
///
/// Routes (any method):
/// - `/api/auth/signin/{provider}` - Redirect to the provider
/// - `/api/auth/callback/{provider}` - Finish the flow and run the sign-in callback
pub fn auth_routes() -> Router<AuthState> {
    Router::new().route(AUTH_ROUTE, any(auth_handler))
}

/// Serve one auth request.
///
/// Can be mounted on any route that declares a catch-all `auth` parameter.
pub async fn auth_handler(
    State(state): State<AuthState>,
    matched: Result<MatchedPath, MatchedPathRejection>,
    params: Result<RawPathParams, RawPathParamsRejection>,
    request: axum::extract::Request,
) -> Response {
    let config = state.config.clone();
    match handle(state, matched.ok(), params.ok(), request).await {
        Ok(response) => response,
        Err(e) if config.settings.is_production() && e.is_internal() => {
            config.logger().error("CONFIGURATION", &e);
            let body = json!({ "message": SERVER_CONFIGURATION_MESSAGE });
            AuthResponse::json(StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        }
        Err(e) => e.into_response(),
    }
}

async fn handle(
    state: AuthState,
    matched: Option<MatchedPath>,
    params: Option<RawPathParams>,
    request: axum::extract::Request,
) -> Result<Response, AuthError> {
    let config = state.config.as_ref();
    let settings = &config.settings;

    let route = route_param(matched.as_ref(), params.as_ref());
    let Some(action) = dispatch(&route)? else {
        tracing::debug!(route = ?route, "No auth action for route");
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let (parts, body) = request.into_parts();
    let host = forwarded_host(&parts.headers);
    let secure = settings.is_production() && !host.is_some_and(is_localhost);

    let target = parts
        .extensions
        .get::<OriginalUri>()
        .map(|uri| &uri.0)
        .unwrap_or(&parts.uri)
        .path_and_query()
        .map(|pq| pq.as_str());
    let forwarded_proto = header(&parts.headers, "x-forwarded-proto");

    let url = match resolve_request_url(
        target,
        forwarded_proto,
        host,
        settings.auth_url.as_ref(),
        settings.is_production(),
    ) {
        Ok(url) => url,
        Err(e) if settings.is_production() => {
            config.logger().error("INVALID_URL", &e);
            let body = json!({ "message": SERVER_CONFIGURATION_MESSAGE });
            return Ok(AuthResponse::json(StatusCode::BAD_REQUEST, body).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let internal =
        match to_internal_request(&url, &parts.method, &parts.headers, RequestBody::from(body))
            .await
        {
            Ok(internal) => internal,
            Err(e) => {
                tracing::error!(method = %parts.method, error = %e, "Failed to normalize auth request");
                let message = format!(
                    "Error: This action with HTTP {} is not supported.",
                    parts.method
                );
                return Ok((StatusCode::BAD_REQUEST, message).into_response());
            }
        };

    let provider_id = internal
        .provider_id
        .as_deref()
        .map(|id| id.split('?').next().unwrap_or(id))
        .unwrap_or_default()
        .to_string();
    let provider = config
        .provider(&provider_id)
        .ok_or_else(|| CoreError::MissingProvider(provider_id.clone()))?;

    let origin = settings.app_origin.as_ref().unwrap_or(&url);
    let callback_url = callback_url(origin, &url, action, &provider_id)?;
    tracing::debug!(
        action = %action,
        provider = %provider_id,
        callback_url = %callback_url,
        secure,
        "Dispatching auth request"
    );

    let protocol = url.scheme().to_string();
    let ctx = RequestContext::new(internal, provider, callback_url, protocol, secure);
    let steps = build_chain(config, action, secure);

    let response = run_chain(&steps, ctx).await?;
    Ok(response.into_response())
}

/// Describe the matched route's `auth` parameter.
fn route_param(matched: Option<&MatchedPath>, params: Option<&RawPathParams>) -> AuthRouteParam {
    let value = params.and_then(|params| {
        params
            .iter()
            .find(|(name, _)| *name == "auth")
            .map(|(_, value)| value)
    });
    let Some(value) = value else {
        return AuthRouteParam::Missing;
    };

    let is_catch_all = matched.is_some_and(|m| m.as_str().contains("{*auth}"));
    if is_catch_all {
        AuthRouteParam::catch_all(value)
    } else {
        AuthRouteParam::Single(value.to_string())
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn forwarded_host(headers: &HeaderMap) -> Option<&str> {
    header(headers, "x-forwarded-host").or_else(|| header(headers, HOST.as_str()))
}

/// The provider callback URL: the adapter's base path on `origin`, followed
/// by `/callback/<provider>`.
fn callback_url(
    origin: &Url,
    request_url: &Url,
    action: AuthAction,
    provider_id: &str,
) -> Result<Url, CoreError> {
    let path = request_url.path();
    let marker = format!("/{}", action.as_str());
    let base = path.find(&marker).map_or(path, |idx| &path[..idx]);

    origin
        .join(&format!("{base}/callback/{provider_id}"))
        .map_err(|e| CoreError::InvalidUrl(e.to_string()))
}
