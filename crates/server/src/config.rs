use std::{env, sync::Arc};

use anyhow::Context;
use blitz_auth::{AuthConfig, AuthSettings, OAuth2Provider};

use crate::callback::DemoSignIn;

/// OAuth client credentials for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Credentials of the providers this server knows how to register.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub github: Option<ClientCredentials>,
    pub google: Option<ClientCredentials>,
}

impl ProviderCredentials {
    /// Load credentials from environment variables.
    ///
    /// Environment variables:
    /// - `GITHUB_CLIENT_ID` / `GITHUB_CLIENT_SECRET`
    /// - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET`
    ///
    /// A provider is only enabled when both of its variables are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let credentials = |prefix: &str| {
            let client_id = lookup(&format!("{prefix}_CLIENT_ID")).filter(|v| !v.is_empty())?;
            let client_secret =
                lookup(&format!("{prefix}_CLIENT_SECRET")).filter(|v| !v.is_empty())?;
            Some(ClientCredentials {
                client_id,
                client_secret,
            })
        };

        Self {
            github: credentials("GITHUB"),
            google: credentials("GOOGLE"),
        }
    }
}

/// Assemble the adapter configuration with the demo sign-in callback.
pub fn auth_config(
    settings: AuthSettings,
    credentials: &ProviderCredentials,
    use_mock: bool,
) -> anyhow::Result<AuthConfig> {
    let mut builder = AuthConfig::builder(settings, Arc::new(DemoSignIn::default()));

    if let Some(github) = &credentials.github {
        let provider = OAuth2Provider::github(&github.client_id, &github.client_secret)
            .context("Failed to configure the GitHub provider")?;
        builder = builder.provider(Arc::new(provider));
    }

    if let Some(google) = &credentials.google {
        let provider = OAuth2Provider::google(&google.client_id, &google.client_secret)
            .context("Failed to configure the Google provider")?;
        builder = builder.provider(Arc::new(provider));
    }

    #[cfg(feature = "mock")]
    if use_mock {
        builder = builder.provider(Arc::new(blitz_auth::MockProvider::default()));
    }

    #[cfg(not(feature = "mock"))]
    if use_mock {
        anyhow::bail!("the mock provider requires the `mock` feature");
    }

    let config = builder.build()?;
    if config.providers().is_empty() {
        tracing::warn!("No OAuth providers configured; sign-in routes will answer 404");
    }
    Ok(config)
}
