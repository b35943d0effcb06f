use async_trait::async_trait;
use serde_json::Value;

use super::{
    Account, AuthError, Authorization, AuthorizationParams, CallbackOutcome, CallbackParams,
    ExchangeResult, Profile, ProviderError, SessionContext,
};

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error type host callbacks may fail with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An OAuth identity provider.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Identifier used in `/signin/<id>` and `/callback/<id>`.
    fn id(&self) -> &str;

    /// Human readable name, e.g. for login buttons.
    fn name(&self) -> &str;

    /// Compute the provider authorization URL and the cookies needed to
    /// finish the flow on callback.
    async fn authorization_url(
        &self,
        params: &AuthorizationParams,
    ) -> std::result::Result<Authorization, ProviderError>;

    /// Exchange the authorization code for the user's profile and account.
    async fn exchange(
        &self,
        params: &CallbackParams,
    ) -> std::result::Result<ExchangeResult, ProviderError>;
}

/// Host hook run after a successful code exchange.
///
/// Typically looks up or creates the user and calls
/// [`SessionContext::create`]. Returning [`CallbackOutcome::Redirect`]
/// overrides the configured success URL.
#[async_trait]
pub trait SignInCallback: Send + Sync {
    async fn on_sign_in(
        &self,
        profile: &Profile,
        account: &Account,
        raw_profile: &Value,
        session: &mut SessionContext,
    ) -> std::result::Result<CallbackOutcome, BoxError>;
}

/// Sink for errors the adapter reports before the chain runs.
pub trait ErrorLogger: Send + Sync {
    fn error(&self, code: &str, error: &dyn std::error::Error);
}
