//! Cookie-backed session storage.
//!
//! The whole session lives in one signed cookie (HS256 JWT). Nothing is kept
//! server side, so revoking a session only clears the cookie.

use async_trait::async_trait;
use blitz_auth_core::auth::{
    AuthError, CookieOptions, CookieSet, ResponseCookie, Result, SessionContext, SessionData,
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{Flow, RequestContext, Step};
use crate::config::AuthSettings;

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    exp: i64,
    #[serde(flatten)]
    data: SessionData,
}

/// Reads and writes the session cookie.
#[derive(Clone)]
pub struct SessionCodec {
    cookie_name: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
    secure: bool,
}

impl SessionCodec {
    pub fn new(settings: &AuthSettings, secure: bool) -> Self {
        let secret = settings.session_secret.as_bytes();
        Self {
            cookie_name: settings.session_cookie_name.clone(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_seconds: i64::try_from(settings.session_ttl.as_secs()).unwrap_or(i64::MAX),
            secure,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Decode a session cookie value. Tampered, expired, or malformed
    /// cookies yield `None` and the request starts with an empty session.
    pub fn decode(&self, value: &str) -> Option<SessionData> {
        let validation = Validation::new(Algorithm::HS256);
        match jsonwebtoken::decode::<SessionClaims>(value, &self.decoding_key, &validation) {
            Ok(token) => Some(token.claims.data),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid session cookie");
                None
            }
        }
    }

    /// # Errors
    ///
    /// Returns `AuthError::Session` if the claims cannot be signed.
    pub fn encode(&self, data: &SessionData) -> Result<String> {
        let claims = SessionClaims {
            exp: Utc::now().timestamp().saturating_add(self.ttl_seconds),
            data: data.clone(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Session(e.to_string()))
    }

    /// Queue the session cookie on `cookies` if the session changed.
    ///
    /// # Errors
    ///
    /// Fails when a secure cookie would be sent over plain `http`, or when
    /// signing fails.
    pub fn commit(
        &self,
        session: &SessionContext,
        protocol: &str,
        cookies: &mut CookieSet,
    ) -> Result<()> {
        if !session.is_dirty() {
            return Ok(());
        }
        if self.secure && protocol != "https" {
            return Err(AuthError::Session(
                "Cannot send secure cookie over unencrypted connection".to_string(),
            ));
        }

        if session.data().is_empty() {
            cookies.push(ResponseCookie::expired(&self.cookie_name, self.secure));
            return Ok(());
        }

        let value = self.encode(session.data())?;
        cookies.push(ResponseCookie::new(
            &self.cookie_name,
            value,
            CookieOptions::flow(self.secure).with_max_age(self.ttl_seconds),
        ));
        Ok(())
    }
}

/// Loads the session from the request cookie and arranges for it to be
/// written back when the chain finishes.
pub struct CookieSessionStep {
    codec: SessionCodec,
}

impl CookieSessionStep {
    pub fn new(codec: SessionCodec) -> Self {
        Self { codec }
    }
}

#[async_trait]
impl Step for CookieSessionStep {
    fn name(&self) -> &'static str {
        "cookie-session"
    }

    async fn run(&self, mut ctx: RequestContext) -> Result<Flow> {
        let session = ctx
            .request
            .cookies
            .get(self.codec.cookie_name())
            .and_then(|value| self.codec.decode(value))
            .map(SessionContext::from_data)
            .unwrap_or_default();

        ctx.session = Some(session);
        ctx.session_codec = Some(self.codec.clone());
        Ok(Flow::Continue(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context_with_cookie;
    use serde_json::json;

    fn codec(secure: bool) -> SessionCodec {
        SessionCodec::new(&AuthSettings::default(), secure)
    }

    fn signed_in() -> SessionContext {
        let mut session = SessionContext::new();
        session.create("user-1", [("role".to_string(), json!("USER"))]);
        session
    }

    #[test]
    fn encoded_session_decodes_with_same_secret() {
        let codec = codec(false);
        let session = signed_in();

        let token = codec.encode(session.data()).unwrap();
        let decoded = codec.decode(&token).unwrap();

        assert_eq!(decoded.user_id.as_deref(), Some("user-1"));
        assert_eq!(decoded.public_data.get("role"), Some(&json!("USER")));
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = codec(false).encode(signed_in().data()).unwrap();
        let other = SessionCodec::new(
            &AuthSettings {
                session_secret: "another-secret".to_string(),
                ..AuthSettings::default()
            },
            false,
        );
        assert!(other.decode(&token).is_none());
        assert!(other.decode("not-a-jwt").is_none());
    }

    #[test]
    fn clean_session_writes_nothing() {
        let mut cookies = CookieSet::new();
        codec(false)
            .commit(&SessionContext::new(), "http", &mut cookies)
            .unwrap();
        assert!(cookies.is_empty());
    }

    #[test]
    fn dirty_session_writes_cookie() {
        let mut cookies = CookieSet::new();
        codec(false)
            .commit(&signed_in(), "http", &mut cookies)
            .unwrap();

        let cookie = cookies.iter().next().unwrap();
        assert_eq!(cookie.name, "session");
        assert!(cookie.options.http_only);
        assert!(!cookie.options.secure);
        assert_eq!(cookie.options.max_age, Some(30 * 24 * 60 * 60));
    }

    #[test]
    fn revoked_session_clears_cookie() {
        let mut session = signed_in();
        session.revoke();

        let mut cookies = CookieSet::new();
        codec(false).commit(&session, "http", &mut cookies).unwrap();

        let cookie = cookies.iter().next().unwrap();
        assert_eq!(cookie.value, "");
        assert_eq!(cookie.options.max_age, Some(0));
    }

    #[test]
    fn secure_cookie_over_http_fails() {
        let mut cookies = CookieSet::new();
        let err = codec(true)
            .commit(&signed_in(), "http", &mut cookies)
            .unwrap_err();
        assert!(matches!(err, AuthError::Session(_)));

        codec(true)
            .commit(&signed_in(), "https", &mut cookies)
            .unwrap();
        assert!(cookies.iter().next().unwrap().options.secure);
    }

    #[tokio::test]
    async fn step_loads_session_from_cookie() {
        let codec = codec(false);
        let token = codec.encode(signed_in().data()).unwrap();
        let ctx = context_with_cookie("/api/auth/callback/github", "session", &token);

        let Flow::Continue(ctx) = CookieSessionStep::new(codec).run(ctx).await.unwrap() else {
            panic!("cookie-session must not terminate");
        };

        let session = ctx.session.unwrap();
        assert_eq!(session.user_id(), Some("user-1"));
        assert!(!session.is_dirty());
        assert!(ctx.session_codec.is_some());
    }

    #[tokio::test]
    async fn step_starts_empty_session_without_cookie() {
        let ctx = context_with_cookie("/api/auth/signin/github", "other", "x");
        let Flow::Continue(ctx) = CookieSessionStep::new(codec(false)).run(ctx).await.unwrap()
        else {
            panic!("cookie-session must not terminate");
        };
        assert!(ctx.session.unwrap().data().is_empty());
    }
}
