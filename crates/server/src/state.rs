use blitz_auth::{AuthConfig, AuthState};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
}

impl AppState {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            auth: AuthState::new(config),
        }
    }
}

impl AsRef<AuthState> for AppState {
    fn as_ref(&self) -> &AuthState {
        &self.auth
    }
}
