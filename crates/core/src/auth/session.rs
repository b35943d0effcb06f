use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::generate_session_handle;

/// Public-data key holding the sign-in redirect target between the sign-in
/// and callback requests.
pub const INTERNAL_REDIRECT_URL_KEY: &str = "_redirectUrl";

/// What the session cookie carries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub handle: Option<String>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub public_data: Map<String, Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl SessionData {
    pub fn is_empty(&self) -> bool {
        self.handle.is_none() && self.user_id.is_none() && self.public_data.is_empty()
    }
}

/// Per-request session store.
///
/// Handed to each chain step explicitly. Mutations mark the session dirty so
/// the cookie-session codec knows to write it back.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    data: SessionData,
    dirty: bool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap data loaded from a request cookie.
    pub fn from_data(data: SessionData) -> Self {
        Self { data, dirty: false }
    }

    pub fn handle(&self) -> Option<&str> {
        self.data.handle.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.data.user_id.as_deref()
    }

    pub fn is_authorized(&self) -> bool {
        self.data.user_id.is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.public_data.get(key)
    }

    /// Merge `data` into the public data, overwriting existing keys.
    pub fn set_public_data<I>(&mut self, data: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.data.public_data.extend(data);
        self.dirty = true;
    }

    /// Start an authenticated session for `user_id`.
    ///
    /// Keys already present in the public data (such as the sign-in redirect
    /// target) are kept unless `public_data` overrides them.
    pub fn create<I>(&mut self, user_id: impl Into<String>, public_data: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.data.handle = Some(generate_session_handle());
        self.data.user_id = Some(user_id.into());
        self.data.created_at = Some(Utc::now());
        self.data.public_data.extend(public_data);
        self.dirty = true;
    }

    /// Drop everything; the session cookie is cleared on commit.
    pub fn revoke(&mut self) {
        self.data = SessionData::default();
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }
}
