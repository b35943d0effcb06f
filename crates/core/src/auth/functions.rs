use rand::{distr::Alphanumeric, Rng};
use url::Url;

use super::{AuthAction, AuthError};

/// Longest error message carried back to the browser in `authError`.
pub const AUTH_ERROR_MAX_LENGTH: usize = 100;

const ELLIPSIS: &str = "...";

/// Shorten `input` to at most `max_len` characters, ending in `...` when cut.
pub fn truncate_string(input: &str, max_len: usize) -> String {
    if input.chars().count() <= max_len {
        return input.to_string();
    }
    let keep = max_len.saturating_sub(ELLIPSIS.len());
    let mut out: String = input.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Build the error page redirect for a failed OAuth step.
///
/// The message is truncated to [`AUTH_ERROR_MAX_LENGTH`] characters and
/// percent-encoded into an `authError` query parameter. `&` is used as the
/// separator when `error_redirect_url` already has a query string.
pub fn error_redirect_url(error_redirect_url: &str, message: &str) -> String {
    let key = if error_redirect_url.contains('?') {
        "&authError="
    } else {
        "?authError="
    };
    let message = truncate_string(message, AUTH_ERROR_MAX_LENGTH);
    format!(
        "{error_redirect_url}{key}{}",
        urlencoding::encode(&message)
    )
}

/// First supported action whose keyword occurs anywhere in `path`.
pub fn detect_action(path: &str) -> Option<AuthAction> {
    AuthAction::ALL
        .into_iter()
        .find(|action| path.contains(action.as_str()))
}

/// The provider id is the last path segment, unless that segment is the
/// action keyword itself (`/api/auth/signin`).
pub fn provider_id_from_path(path: &str, action: AuthAction) -> Option<String> {
    let last = path.rsplit('/').next()?;
    if last.is_empty() || action.as_str().contains(last) {
        return None;
    }
    let id = last.split('?').next().unwrap_or(last);
    if id.is_empty() {
        return None;
    }
    Some(id.to_string())
}

/// Whether a `Host` header value points at the local machine.
pub fn is_localhost(host: &str) -> bool {
    let hostname = if let Some(rest) = host.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else {
        host.split(':').next().unwrap_or(host)
    };
    matches!(hostname, "localhost" | "127.0.0.1" | "::1")
}

/// Protocol announced by a TLS-terminating proxy, `http` when absent.
pub fn forwarded_protocol(x_forwarded_proto: Option<&str>) -> String {
    x_forwarded_proto
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "http".to_string())
}

/// Reconstruct the absolute URL of an incoming request.
///
/// With a configured `base` the request target is resolved against it. A
/// base carrying a custom path has a trailing `/api/auth` stripped and is
/// prefixed to the target. Without a base the origin comes from the
/// forwarded protocol (defaulting to `https` in production, `http`
/// otherwise) and the forwarded host or `Host` header.
///
/// # Errors
///
/// Returns `AuthError::InvalidUrl` when the target or host is missing, the
/// protocol is neither `http` nor `https`, or the result does not parse.
pub fn resolve_request_url(
    target: Option<&str>,
    forwarded_proto: Option<&str>,
    host: Option<&str>,
    base: Option<&Url>,
    production: bool,
) -> Result<Url, AuthError> {
    let target = target
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidUrl("Missing url".to_string()))?;

    if let Some(base) = base {
        if !matches!(base.scheme(), "http" | "https") {
            return Err(AuthError::InvalidUrl("Invalid protocol".to_string()));
        }
        if base.path() != "/" {
            let path = base.path();
            let base_path = path
                .strip_suffix("/api/auth/")
                .or_else(|| path.strip_suffix("/api/auth"))
                .unwrap_or(path);
            let base_path = base_path.strip_suffix('/').unwrap_or(base_path);
            return base
                .join(&format!("{base_path}{target}"))
                .map_err(|e| AuthError::InvalidUrl(e.to_string()));
        }
        return base
            .join(target)
            .map_err(|e| AuthError::InvalidUrl(e.to_string()));
    }

    let proto = forwarded_proto.unwrap_or(if production { "https" } else { "http" });
    if !matches!(proto, "http" | "https") {
        return Err(AuthError::InvalidUrl("Invalid protocol".to_string()));
    }
    let host = host
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AuthError::InvalidUrl("Missing host".to_string()))?;

    Url::parse(&format!("{proto}://{host}"))
        .and_then(|origin| origin.join(target))
        .map_err(|e| AuthError::InvalidUrl(e.to_string()))
}

/// Generate a random session handle.
pub fn generate_session_handle() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_leaves_short_strings_alone() {
        assert_eq!(truncate_string("boom", 100), "boom");
        assert_eq!(truncate_string("", 100), "");
    }

    #[test]
    fn truncate_cuts_long_strings_to_max_len() {
        let long = "x".repeat(250);
        let out = truncate_string(&long, 100);
        assert_eq!(out.chars().count(), 100);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        let s = "é".repeat(100);
        assert_eq!(truncate_string(&s, 100), s);
    }

    #[test]
    fn error_redirect_appends_query() {
        assert_eq!(error_redirect_url("/login", "boom"), "/login?authError=boom");
    }

    #[test]
    fn error_redirect_extends_existing_query() {
        assert_eq!(
            error_redirect_url("/login?next=home", "boom"),
            "/login?next=home&authError=boom"
        );
    }

    #[test]
    fn error_redirect_encodes_message() {
        assert_eq!(
            error_redirect_url("/login", "state mismatch & more"),
            "/login?authError=state%20mismatch%20%26%20more"
        );
    }

    #[test]
    fn error_redirect_truncates_message() {
        let url = error_redirect_url("/login", &"a".repeat(300));
        let value = url.strip_prefix("/login?authError=").unwrap();
        assert_eq!(value.len(), 100);
        assert!(value.ends_with("..."));
    }

    #[test]
    fn detect_action_finds_signin_and_callback() {
        assert_eq!(
            detect_action("/api/auth/signin/github"),
            Some(AuthAction::SignIn)
        );
        assert_eq!(
            detect_action("/api/auth/callback/github"),
            Some(AuthAction::Callback)
        );
    }

    #[test]
    fn detect_action_rejects_unknown_paths() {
        assert_eq!(detect_action("/api/auth/session"), None);
        assert_eq!(detect_action("/api/auth/signout"), None);
        assert_eq!(detect_action("/"), None);
    }

    #[test]
    fn provider_id_is_last_segment() {
        assert_eq!(
            provider_id_from_path("/api/auth/signin/github", AuthAction::SignIn),
            Some("github".to_string())
        );
        assert_eq!(
            provider_id_from_path("/api/auth/callback/google", AuthAction::Callback),
            Some("google".to_string())
        );
    }

    #[test]
    fn provider_id_absent_when_last_segment_is_action() {
        assert_eq!(
            provider_id_from_path("/api/auth/signin", AuthAction::SignIn),
            None
        );
        assert_eq!(
            provider_id_from_path("/api/auth/callback", AuthAction::Callback),
            None
        );
    }

    #[test]
    fn provider_id_drops_query_suffix() {
        assert_eq!(
            provider_id_from_path("/api/auth/signin/github?x=1", AuthAction::SignIn),
            Some("github".to_string())
        );
    }

    #[test]
    fn localhost_detection() {
        assert!(is_localhost("localhost"));
        assert!(is_localhost("localhost:3000"));
        assert!(is_localhost("127.0.0.1:3000"));
        assert!(is_localhost("[::1]:3000"));
        assert!(!is_localhost("example.com"));
        assert!(!is_localhost("localhost.example.com"));
    }

    #[test]
    fn forwarded_protocol_takes_first_value() {
        assert_eq!(forwarded_protocol(Some("https, http")), "https");
        assert_eq!(forwarded_protocol(Some("HTTPS")), "https");
        assert_eq!(forwarded_protocol(None), "http");
        assert_eq!(forwarded_protocol(Some("")), "http");
    }

    #[test]
    fn resolve_url_from_host_header() {
        let url = resolve_request_url(
            Some("/api/auth/signin/github?x=1"),
            None,
            Some("localhost:3000"),
            None,
            false,
        )
        .unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/auth/signin/github?x=1");
    }

    #[test]
    fn resolve_url_defaults_to_https_in_production() {
        let url =
            resolve_request_url(Some("/api/auth/signin"), None, Some("app.io"), None, true)
                .unwrap();
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn resolve_url_honors_forwarded_proto() {
        let url = resolve_request_url(
            Some("/api/auth/signin"),
            Some("https"),
            Some("app.io"),
            None,
            false,
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://app.io/api/auth/signin");
    }

    #[test]
    fn resolve_url_rejects_bad_protocol_and_missing_host() {
        assert!(matches!(
            resolve_request_url(Some("/a"), Some("ftp"), Some("app.io"), None, false),
            Err(AuthError::InvalidUrl(_))
        ));
        assert!(matches!(
            resolve_request_url(Some("/a"), None, None, None, false),
            Err(AuthError::InvalidUrl(_))
        ));
        assert!(matches!(
            resolve_request_url(None, None, Some("app.io"), None, false),
            Err(AuthError::InvalidUrl(_))
        ));
    }

    #[test]
    fn resolve_url_against_base() {
        let base = Url::parse("https://app.io").unwrap();
        let url = resolve_request_url(
            Some("/api/auth/callback/github"),
            None,
            None,
            Some(&base),
            true,
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://app.io/api/auth/callback/github");
    }

    #[test]
    fn resolve_url_against_base_with_custom_path() {
        let base = Url::parse("https://app.io/tenant/api/auth").unwrap();
        let url = resolve_request_url(
            Some("/api/auth/signin/github"),
            None,
            None,
            Some(&base),
            true,
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://app.io/tenant/api/auth/signin/github");
    }

    #[test]
    fn generate_session_handle_produces_32_char_alphanumeric() {
        let handle = generate_session_handle();
        assert_eq!(handle.len(), 32);
        assert!(handle.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(handle, generate_session_handle());
    }
}
