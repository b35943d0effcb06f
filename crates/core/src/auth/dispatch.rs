use super::{AuthAction, ConfigurationError};

/// How the host router exposed the `auth` route parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRouteParam {
    /// The route has no parameter named `auth`.
    Missing,
    /// The route captured `auth` as a single segment (`{auth}`).
    Single(String),
    /// The route captured `auth` as a catch-all (`{*auth}`), split on `/`.
    CatchAll(Vec<String>),
}

impl AuthRouteParam {
    /// Split a catch-all capture into its non-empty segments.
    pub fn catch_all(raw: &str) -> Self {
        Self::CatchAll(
            raw.split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

/// Classify a request by its route segments.
///
/// Returns `Ok(None)` when the request must be answered with a bare 404:
/// no segments, or a first segment outside the supported actions.
///
/// # Errors
///
/// Returns a `ConfigurationError` when the adapter is mounted on a route
/// without a catch-all `auth` parameter.
pub fn dispatch(param: &AuthRouteParam) -> Result<Option<AuthAction>, ConfigurationError> {
    let segments = match param {
        AuthRouteParam::Missing => return Err(ConfigurationError::MissingAuthParam),
        AuthRouteParam::Single(_) => return Err(ConfigurationError::AuthParamNotCatchAll),
        AuthRouteParam::CatchAll(segments) => segments,
    };

    Ok(segments.first().and_then(|first| first.parse().ok()))
}
