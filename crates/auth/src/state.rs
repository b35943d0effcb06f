//! Application state for auth.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::chain::SessionCodec;
use crate::config::AuthConfig;

/// Shared state for the auth handler and extractors.
#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<AuthConfig>,
}

impl AuthState {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Codec for reading the session cookie outside the chain.
    pub(crate) fn session_reader(&self) -> SessionCodec {
        SessionCodec::new(&self.config.settings, false)
    }
}

/// Allows AuthState to be extracted from a parent state.
impl<S> FromRef<S> for AuthState
where
    S: AsRef<AuthState>,
{
    fn from_ref(state: &S) -> Self {
        state.as_ref().clone()
    }
}
