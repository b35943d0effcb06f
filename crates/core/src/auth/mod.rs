mod cookies;
mod dispatch;
mod error;
mod functions;
mod request;
mod session;
mod traits;
mod types;

pub use cookies::CookieSet;
pub use dispatch::{dispatch, AuthRouteParam};
pub use error::{AuthError, ConfigurationError, NormalizationError, ProviderError};
pub use functions::{
    detect_action, error_redirect_url, forwarded_protocol, generate_session_handle, is_localhost,
    provider_id_from_path, resolve_request_url, truncate_string, AUTH_ERROR_MAX_LENGTH,
};
pub use request::NormalizedRequest;
pub use session::{SessionContext, SessionData, INTERNAL_REDIRECT_URL_KEY};
pub use traits::{BoxError, ErrorLogger, OAuthProvider, Result, SignInCallback};
pub use types::{
    Account, AuthAction, Authorization, AuthorizationParams, CallbackOutcome, CallbackParams,
    CookieOptions, ExchangeResult, Profile, ResponseCookie, SameSite,
};
