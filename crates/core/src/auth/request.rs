use std::collections::BTreeMap;

use serde_json::{Map, Value};
use url::Url;

use super::{detect_action, provider_id_from_path};
use super::{AuthAction, NormalizationError};

/// Canonical view of an inbound auth request.
///
/// Built once per request and not mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRequest {
    pub url: Url,
    pub action: AuthAction,
    pub provider_id: Option<String>,
    pub method: String,
    /// Header names are lowercase. Repeated headers are joined with `, `.
    pub headers: BTreeMap<String, String>,
    pub body: Option<Map<String, Value>>,
    /// Request cookies, filled in by the HTTP layer.
    pub cookies: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub error: Option<String>,
}

impl NormalizedRequest {
    /// Classify an already-parsed request.
    ///
    /// One trailing `/` is stripped from `url` before the action is detected.
    ///
    /// # Errors
    ///
    /// Returns `NormalizationError` when the path names neither `signin` nor
    /// `callback`, or the URL does not parse.
    pub fn new(
        url: &str,
        method: impl Into<String>,
        headers: BTreeMap<String, String>,
        body: Option<Map<String, Value>>,
    ) -> Result<Self, NormalizationError> {
        let trimmed = url.strip_suffix('/').unwrap_or(url);
        let url = Url::parse(trimmed).map_err(|e| NormalizationError(e.to_string()))?;

        let action = detect_action(url.path())
            .ok_or_else(|| NormalizationError("Cannot detect action.".to_string()))?;
        let provider_id = provider_id_from_path(url.path(), action);

        let query: BTreeMap<String, String> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let error = query.get("error").cloned();

        let method = method.into();
        let method = if method.is_empty() {
            "GET".to_string()
        } else {
            method
        };

        Ok(Self {
            url,
            action,
            provider_id,
            method,
            headers,
            body,
            cookies: BTreeMap::new(),
            query,
            error,
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}
