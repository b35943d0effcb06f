use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use blitz_auth_core::auth::ConfigurationError;
use thiserror::Error;

/// Auth errors for the blitz_auth crate.
///
/// This wraps the core `AuthError` and adds crate-specific error variants
/// for I/O operations that can't be in the functional core.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Error from the core auth module (dispatch, normalization, providers, ...)
    #[error(transparent)]
    Core(#[from] blitz_auth_core::auth::AuthError),

    /// HTTP client error while talking to a provider
    #[error("HTTP error: {0}")]
    Http(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Failures caused by how the server is set up rather than by the
    /// request. Their details stay in the logs in production.
    pub fn is_internal(&self) -> bool {
        use blitz_auth_core::auth::AuthError as CoreError;

        matches!(
            self,
            AuthError::Config(_)
                | AuthError::Core(
                    CoreError::Configuration(_) | CoreError::Session(_) | CoreError::InvalidUrl(_)
                )
        )
    }
}

impl From<ConfigurationError> for AuthError {
    fn from(err: ConfigurationError) -> Self {
        AuthError::Core(err.into())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        use blitz_auth_core::auth::AuthError as CoreError;

        let (status, message) = match &self {
            AuthError::Core(core_err) => match core_err {
                CoreError::Configuration(_) | CoreError::Session(_) => {
                    tracing::error!("Auth configuration error: {}", self);
                    (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
                }
                CoreError::InvalidUrl(_) => {
                    tracing::error!("INVALID_URL: {}", self);
                    (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
                }
                CoreError::Normalization(_) => (StatusCode::BAD_REQUEST, self.to_string()),
                CoreError::MissingProvider(provider) => (
                    StatusCode::NOT_FOUND,
                    format!("Authentication provider '{}' is not configured", provider),
                ),
                CoreError::Provider(_) => {
                    tracing::error!("Auth error: {}", self);
                    (
                        StatusCode::BAD_GATEWAY,
                        "Authentication provider error".to_string(),
                    )
                }
            },
            AuthError::Http(_) => {
                tracing::error!("HTTP error during auth: {}", self);
                (
                    StatusCode::BAD_GATEWAY,
                    "Authentication provider error".to_string(),
                )
            }
            AuthError::Config(_) => {
                tracing::error!("Config error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}
