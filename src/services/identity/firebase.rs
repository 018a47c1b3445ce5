use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::{Algorithm, Validation};
use serde::Deserialize;

use crate::services::identity::keys::PublicKeyCache;
use crate::services::identity::verifier::{AuthError, IdentityVerifier, VerifiedIdentity};

/// Public keys used to sign Firebase ID tokens (JWK form).
pub const SECURE_TOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const MAX_UID_LEN: usize = 128;

/// Firebase ID token claims.
///
/// NOTE:
/// - `aud` is always a single string (the project id) for ID tokens.
/// - `firebase.sign_in_provider` is informational; it is logged, never trusted for authz.
#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,

    #[serde(default)]
    pub auth_time: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub firebase: Option<FirebaseClaim>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseClaim {
    #[serde(default)]
    pub sign_in_provider: Option<String>,
}

impl From<IdTokenClaims> for VerifiedIdentity {
    fn from(claims: IdTokenClaims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
            sign_in_provider: claims.firebase.and_then(|f| f.sign_in_provider),
            auth_time: claims.auth_time,
            expires_at: claims.exp,
        }
    }
}

/// Firebase ID token verifier.
///
/// - With a key cache: RS256 signature + claim checks (production).
/// - Without one (emulator): the signature segment is ignored, claim checks still apply.
pub struct FirebaseTokenVerifier {
    project_id: String,
    issuer: String,
    leeway_seconds: u64,
    keys: Option<PublicKeyCache>,
}

impl std::fmt::Debug for FirebaseTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseTokenVerifier")
            .field("project_id", &self.project_id)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("emulator", &self.keys.is_none())
            .finish()
    }
}

impl FirebaseTokenVerifier {
    pub fn new(project_id: impl Into<String>, keys: PublicKeyCache, leeway_seconds: u64) -> Self {
        Self::build(project_id.into(), Some(keys), leeway_seconds)
    }

    /// Accepts unsigned tokens as minted by the Auth emulator.
    pub fn emulator(project_id: impl Into<String>, leeway_seconds: u64) -> Self {
        Self::build(project_id.into(), None, leeway_seconds)
    }

    fn build(project_id: String, keys: Option<PublicKeyCache>, leeway_seconds: u64) -> Self {
        let issuer = format!("{ISSUER_PREFIX}{project_id}");
        Self {
            project_id,
            issuer,
            leeway_seconds,
            keys,
        }
    }

    async fn decode_signed(
        &self,
        token: &str,
        keys: &PublicKeyCache,
    ) -> Result<IdTokenClaims, AuthError> {
        let header = jsonwebtoken::decode_header(token)?;

        if header.alg != Algorithm::RS256 {
            return Err(AuthError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let kid = header.kid.ok_or(AuthError::UnknownKey(None))?;
        let key = keys.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "aud", "iss"]);
        validation.leeway = self.leeway_seconds;

        let data = jsonwebtoken::decode::<IdTokenClaims>(token, &key, &validation)?;
        Ok(data.claims)
    }

    /// Claim checks shared by the signed and emulator paths.
    ///
    /// `jsonwebtoken::Validation` already covers `exp`/`aud`/`iss` for signed tokens;
    /// the emulator path has no such pass, so everything is checked here again.
    pub fn check_claims(&self, claims: &IdTokenClaims, now: i64) -> Result<(), AuthError> {
        let leeway = self.leeway_seconds as i64;

        if claims.aud != self.project_id {
            return Err(AuthError::InvalidClaim("aud"));
        }
        if claims.iss != self.issuer {
            return Err(AuthError::InvalidClaim("iss"));
        }
        if claims.sub.is_empty() || claims.sub.len() > MAX_UID_LEN {
            return Err(AuthError::InvalidClaim("sub"));
        }
        if claims.exp + leeway <= now {
            return Err(AuthError::InvalidClaim("exp"));
        }
        if claims.iat - leeway > now {
            return Err(AuthError::InvalidClaim("iat"));
        }
        if let Some(auth_time) = claims.auth_time
            && auth_time - leeway > now
        {
            return Err(AuthError::InvalidClaim("auth_time"));
        }

        Ok(())
    }
}

fn decode_unsigned(token: &str) -> Result<IdTokenClaims, AuthError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or(AuthError::Malformed("missing payload segment"))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| AuthError::Malformed("payload is not base64url"))?;

    serde_json::from_slice(&bytes).map_err(|_| AuthError::Malformed("payload is not a claim set"))
}

#[async_trait]
impl IdentityVerifier for FirebaseTokenVerifier {
    fn backend_name(&self) -> &'static str {
        if self.keys.is_some() {
            "firebase"
        } else {
            "firebase-emulator"
        }
    }

    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        if token.split('.').count() != 3 {
            return Err(AuthError::Malformed("expected three segments"));
        }

        let claims = match &self.keys {
            Some(keys) => self.decode_signed(token, keys).await?,
            None => decode_unsigned(token)?,
        };

        self.check_claims(&claims, Utc::now().timestamp())?;

        Ok(claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn claims() -> IdTokenClaims {
        IdTokenClaims {
            iss: "https://securetoken.google.com/demo-tables".into(),
            aud: "demo-tables".into(),
            sub: "u1".into(),
            exp: NOW + 3600,
            iat: NOW - 10,
            auth_time: Some(NOW - 10),
            email: None,
            firebase: None,
        }
    }

    fn encode_unsigned(payload: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.")
    }

    #[test]
    fn accepts_well_formed_claims() {
        let verifier = FirebaseTokenVerifier::emulator("demo-tables", 0);
        assert!(verifier.check_claims(&claims(), NOW).is_ok());
    }

    #[test]
    fn rejects_foreign_project() {
        let verifier = FirebaseTokenVerifier::emulator("other-project", 0);
        assert!(matches!(
            verifier.check_claims(&claims(), NOW),
            Err(AuthError::InvalidClaim("aud"))
        ));
    }

    #[test]
    fn rejects_bad_subject() {
        let verifier = FirebaseTokenVerifier::emulator("demo-tables", 0);

        let mut c = claims();
        c.sub = String::new();
        assert!(matches!(
            verifier.check_claims(&c, NOW),
            Err(AuthError::InvalidClaim("sub"))
        ));

        c.sub = "x".repeat(129);
        assert!(matches!(
            verifier.check_claims(&c, NOW),
            Err(AuthError::InvalidClaim("sub"))
        ));
    }

    #[test]
    fn leeway_applies_to_time_claims() {
        let strict = FirebaseTokenVerifier::emulator("demo-tables", 0);
        let lenient = FirebaseTokenVerifier::emulator("demo-tables", 30);

        let mut c = claims();
        c.exp = NOW - 5;
        assert!(matches!(
            strict.check_claims(&c, NOW),
            Err(AuthError::InvalidClaim("exp"))
        ));
        assert!(lenient.check_claims(&c, NOW).is_ok());

        let mut c = claims();
        c.auth_time = Some(NOW + 10);
        assert!(matches!(
            strict.check_claims(&c, NOW),
            Err(AuthError::InvalidClaim("auth_time"))
        ));
        assert!(lenient.check_claims(&c, NOW).is_ok());
    }

    #[tokio::test]
    async fn emulator_accepts_unsigned_tokens() {
        let verifier = FirebaseTokenVerifier::emulator("demo-tables", 0);
        let now = Utc::now().timestamp();
        let token = encode_unsigned(serde_json::json!({
            "iss": "https://securetoken.google.com/demo-tables",
            "aud": "demo-tables",
            "sub": "player-1",
            "iat": now - 1,
            "exp": now + 600,
            "email": "p1@example.com",
            "firebase": { "sign_in_provider": "password" }
        }));

        let identity = verifier.verify(&token).await.unwrap();

        assert_eq!(identity.uid, "player-1");
        assert_eq!(identity.email.as_deref(), Some("p1@example.com"));
        assert_eq!(identity.sign_in_provider.as_deref(), Some("password"));
        assert_eq!(verifier.backend_name(), "firebase-emulator");
    }

    #[tokio::test]
    async fn empty_and_malformed_tokens_fail() {
        let verifier = FirebaseTokenVerifier::emulator("demo-tables", 0);

        assert!(matches!(
            verifier.verify("").await,
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            verifier.verify("not-a-jwt").await,
            Err(AuthError::Malformed(_))
        ));
        assert!(matches!(
            verifier.verify("a.%%%.c").await,
            Err(AuthError::Malformed(_))
        ));
    }
}
