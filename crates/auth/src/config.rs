use std::sync::Arc;
use std::time::Duration;

use blitz_auth_core::auth::{ErrorLogger, OAuthProvider, SignInCallback};
use url::Url;

use crate::error::AuthError;

/// Secret used when `SESSION_SECRET_KEY` is not set.
pub const DEFAULT_SESSION_SECRET: &str = "default-dev-secret";

/// Deployment environment. Production turns on secure cookies and hides
/// configuration errors from the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }
}

/// Process-wide settings, read-only after startup.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub environment: Environment,
    pub session_secret: String,
    pub session_cookie_name: String,
    pub session_ttl: Duration,
    /// Trust `X-Forwarded-Proto` from a TLS-terminating proxy.
    pub secure_proxy: bool,
    pub error_redirect_url: String,
    pub success_redirect_url: String,
    /// Base URL incoming request targets are resolved against.
    pub auth_url: Option<Url>,
    /// Origin used to build provider callback URLs.
    pub app_origin: Option<Url>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            session_secret: DEFAULT_SESSION_SECRET.to_string(),
            session_cookie_name: "session".to_string(),
            session_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            secure_proxy: false,
            error_redirect_url: "/login".to_string(),
            success_redirect_url: "/".to_string(),
            auth_url: None,
            app_origin: None,
        }
    }
}

impl AuthSettings {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `APP_ENV`: `production` enables production behavior (default: development)
    /// - `SESSION_SECRET_KEY`: Session cookie signing secret (default: `default-dev-secret`)
    /// - `SESSION_COOKIE_NAME`: Session cookie name (default: `session`)
    /// - `SESSION_TTL_DAYS`: Session TTL in days (default: 30)
    /// - `AUTH_SECURE_PROXY`: Trust `X-Forwarded-Proto` (default: false)
    /// - `AUTH_ERROR_REDIRECT_URL`: Where failed flows land (default: `/login`)
    /// - `AUTH_SUCCESS_REDIRECT_URL`: Where successful flows land (default: `/`)
    /// - `AUTH_URL`: Base URL for resolving request targets (optional)
    /// - `APP_ORIGIN`: Origin for provider callback URLs (optional)
    ///
    /// # Errors
    ///
    /// Returns an error if `AUTH_URL` or `APP_ORIGIN` is set but not a valid URL.
    pub fn from_env() -> Result<Self, AuthError> {
        let defaults = Self::default();

        let environment = std::env::var("APP_ENV")
            .map(|v| Environment::parse(&v))
            .unwrap_or_default();

        let session_secret = std::env::var("SESSION_SECRET_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.session_secret);

        if environment == Environment::Production && session_secret == DEFAULT_SESSION_SECRET {
            tracing::warn!("SESSION_SECRET_KEY is not set; using the development secret");
        }

        let session_ttl = std::env::var("SESSION_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(|days| Duration::from_secs(days * 24 * 60 * 60))
            .unwrap_or(defaults.session_ttl);

        let secure_proxy = std::env::var("AUTH_SECURE_PROXY")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            environment,
            session_secret,
            session_cookie_name: std::env::var("SESSION_COOKIE_NAME")
                .unwrap_or(defaults.session_cookie_name),
            session_ttl,
            secure_proxy,
            error_redirect_url: std::env::var("AUTH_ERROR_REDIRECT_URL")
                .unwrap_or(defaults.error_redirect_url),
            success_redirect_url: std::env::var("AUTH_SUCCESS_REDIRECT_URL")
                .unwrap_or(defaults.success_redirect_url),
            auth_url: optional_url("AUTH_URL")?,
            app_origin: optional_url("APP_ORIGIN")?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn optional_url(var: &str) -> Result<Option<Url>, AuthError> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => value
            .parse()
            .map(Some)
            .map_err(|e| AuthError::Config(format!("{var} must be a valid URL: {e}"))),
        _ => Ok(None),
    }
}

/// Default [`ErrorLogger`] that reports through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorLogger;

impl ErrorLogger for TracingErrorLogger {
    fn error(&self, code: &str, error: &dyn std::error::Error) {
        tracing::error!(code, error = %error, "auth adapter error");
    }
}

/// Complete adapter configuration: settings plus the host's collaborators.
#[derive(Clone)]
pub struct AuthConfig {
    pub settings: AuthSettings,
    providers: Vec<Arc<dyn OAuthProvider>>,
    callback: Arc<dyn SignInCallback>,
    logger: Arc<dyn ErrorLogger>,
}

impl AuthConfig {
    pub fn builder(settings: AuthSettings, callback: Arc<dyn SignInCallback>) -> AuthConfigBuilder {
        AuthConfigBuilder {
            settings,
            providers: Vec::new(),
            callback,
            logger: None,
        }
    }

    pub fn provider(&self, id: &str) -> Option<Arc<dyn OAuthProvider>> {
        self.providers.iter().find(|p| p.id() == id).cloned()
    }

    pub fn providers(&self) -> &[Arc<dyn OAuthProvider>] {
        &self.providers
    }

    pub fn callback(&self) -> Arc<dyn SignInCallback> {
        self.callback.clone()
    }

    pub fn logger(&self) -> &dyn ErrorLogger {
        self.logger.as_ref()
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("settings", &self.settings)
            .field(
                "providers",
                &self.providers.iter().map(|p| p.id()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

pub struct AuthConfigBuilder {
    settings: AuthSettings,
    providers: Vec<Arc<dyn OAuthProvider>>,
    callback: Arc<dyn SignInCallback>,
    logger: Option<Arc<dyn ErrorLogger>>,
}

impl AuthConfigBuilder {
    pub fn provider(mut self, provider: Arc<dyn OAuthProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn ErrorLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// # Errors
    ///
    /// Returns an error if two providers share an id.
    pub fn build(self) -> Result<AuthConfig, AuthError> {
        for (i, provider) in self.providers.iter().enumerate() {
            if self.providers[..i].iter().any(|p| p.id() == provider.id()) {
                return Err(AuthError::Config(format!(
                    "duplicate provider id: {}",
                    provider.id()
                )));
            }
        }

        Ok(AuthConfig {
            settings: self.settings,
            providers: self.providers,
            callback: self.callback,
            logger: self
                .logger
                .unwrap_or_else(|| Arc::new(TracingErrorLogger)),
        })
    }
}
