//! Demo sign-in callback.
//!
//! Users live in memory for the lifetime of the process. A user is keyed by
//! the provider account that signed in, so signing in twice with the same
//! account yields the same user id.

use std::collections::HashMap;

use async_trait::async_trait;
use blitz_auth_core::auth::{
    Account, BoxError, CallbackOutcome, Profile, SessionContext, SignInCallback,
};
use serde_json::{json, Value};
use tokio::sync::RwLock;

/// Where first-time users land after signing in.
pub const WELCOME_URL: &str = "/?welcome=1";

#[derive(Default)]
pub struct DemoSignIn {
    /// `provider:account id` -> user id
    users: RwLock<HashMap<String, String>>,
}

impl DemoSignIn {
    /// Look up the user for `account`, creating one on first sign-in.
    async fn find_or_create(&self, account: &Account) -> (String, bool) {
        let key = format!("{}:{}", account.provider, account.provider_account_id);
        let mut users = self.users.write().await;
        if let Some(user_id) = users.get(&key) {
            return (user_id.clone(), false);
        }
        let user_id = format!("user-{}", users.len() + 1);
        users.insert(key, user_id.clone());
        (user_id, true)
    }
}

#[async_trait]
impl SignInCallback for DemoSignIn {
    async fn on_sign_in(
        &self,
        profile: &Profile,
        account: &Account,
        _raw_profile: &Value,
        session: &mut SessionContext,
    ) -> Result<CallbackOutcome, BoxError> {
        let (user_id, created) = self.find_or_create(account).await;

        tracing::info!(
            user_id = %user_id,
            provider = %account.provider,
            created,
            "User signed in"
        );

        session.create(
            user_id,
            [
                ("name".to_string(), json!(profile.name)),
                ("email".to_string(), json!(profile.email)),
                ("provider".to_string(), json!(account.provider)),
            ],
        );

        Ok(if created {
            CallbackOutcome::from(WELCOME_URL)
        } else {
            CallbackOutcome::Default
        })
    }
}
