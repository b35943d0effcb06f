//! OAuth sign-in adapter for axum.
//!
//! This crate provides:
//! - A catch-all `/api/auth/{*auth}` handler serving the `signin` and
//!   `callback` actions
//! - A step-based middleware chain with a signed cookie session
//! - A generic OAuth 2.0 + PKCE provider with GitHub and Google presets
//! - Axum extractors for the session cookie

pub mod chain;
mod config;
mod error;
mod extractors;
mod handlers;
mod normalize;
mod providers;
mod response;
mod state;

#[cfg(test)]
mod test_support;

pub use config::{
    AuthConfig, AuthConfigBuilder, AuthSettings, Environment, TracingErrorLogger,
    DEFAULT_SESSION_SECRET,
};
pub use error::AuthError;
pub use extractors::{CurrentSession, OptionalSession};
pub use handlers::{auth_handler, auth_routes, AUTH_ROUTE};
pub use normalize::{to_internal_request, to_request, RequestBody};
#[cfg(feature = "mock")]
pub use providers::MockProvider;
pub use providers::{
    OAuth2Provider, OAuth2ProviderConfig, ProfileMapper, FLOW_COOKIE_MAX_AGE, PKCE_COOKIE,
    STATE_COOKIE,
};
pub use response::{serialize_cookie, AuthResponse};
pub use state::AuthState;
