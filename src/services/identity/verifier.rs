//! Identity verification interface used by the access middleware.
use async_trait::async_trait;
use thiserror::Error;

/// Why a bearer token was not accepted.
///
/// Kept independent from `AppError`: the middleware logs the detail and answers
/// with a generic 401.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no id token provided")]
    MissingToken,
    #[error("malformed id token: {0}")]
    Malformed(&'static str),
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("no public key matches kid {0:?}")]
    UnknownKey(Option<String>),
    #[error("id token rejected: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("invalid '{0}' claim")]
    InvalidClaim(&'static str),
    #[error("public key fetch failed: {0}")]
    KeyFetch(String),
}

/// Identity returned by a successful verification.
///
/// Lives for one request; only `uid` is ever persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: String,
    pub email: Option<String>,
    pub sign_in_provider: Option<String>,
    pub auth_time: Option<i64>,
    pub expires_at: i64,
}

impl VerifiedIdentity {
    pub fn new(uid: impl Into<String>, expires_at: i64) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            sign_in_provider: None,
            auth_time: None,
            expires_at,
        }
    }
}

/// Verifies an opaque bearer token against an identity service.
///
/// Implementations are shared process-wide behind `Arc<dyn IdentityVerifier>`
/// and must be safe to call concurrently.
#[async_trait]
pub trait IdentityVerifier: Send + Sync + 'static {
    // Backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // Fails for empty, malformed, expired or otherwise rejected tokens.
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError>;
}
