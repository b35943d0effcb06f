use thiserror::Error;

/// Wiring mistakes in the host application.
///
/// A correctly mounted adapter never produces these; they abort the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("route parameter `auth` is not defined. Mount the adapter on a catch-all route named {{*auth}}")]
    MissingAuthParam,

    #[error("route parameter `auth` must be a catch-all. Mount the adapter on a catch-all route named {{*auth}}")]
    AuthParamNotCatchAll,

    #[error("Missing session middleware")]
    MissingSession,

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The request path does not name a supported action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct NormalizationError(pub String);

/// Failures inside the OAuth provider calls.
///
/// The display form of these errors is what ends up (truncated) in the
/// `authError` query parameter, so the message variants render bare.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("{0}")]
    Exchange(String),

    #[error("OAuth state mismatch")]
    InvalidState,

    #[error("missing authorization code")]
    MissingCode,

    #[error("missing PKCE code verifier")]
    MissingVerifier,

    #[error("failed to fetch profile: {0}")]
    Profile(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error("invalid request url: {0}")]
    InvalidUrl(String),

    #[error("provider not configured: {0}")]
    MissingProvider(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("session error: {0}")]
    Session(String),
}
