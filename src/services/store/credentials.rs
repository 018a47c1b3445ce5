//! Access tokens for the document store (application default credentials).
//!
//! Resolution order:
//! - emulator → fixed `owner` token
//! - `GOOGLE_OAUTH_ACCESS_TOKEN` → static token
//! - `GOOGLE_APPLICATION_CREDENTIALS` → service-account key, JWT-bearer exchange
//! - otherwise the platform metadata server
use std::path::Path;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::Config;
use crate::services::store::client::{StoreError, StoreResult};

pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
// Refresh this long before the reported expiry.
const EXPIRY_MARGIN_SECONDS: i64 = 60;
// Google access tokens live one hour; anything longer is not trusted.
const MAX_TOKEN_LIFETIME_SECONDS: i64 = 12 * 60 * 60;

/// Service-account key file (only the fields we need).
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

enum Kind {
    Emulator,
    Static(String),
    ServiceAccount {
        client_email: String,
        token_uri: String,
        signing_key: EncodingKey,
    },
    Metadata {
        url: String,
    },
}

/// Process-wide access token provider for the store client.
///
/// Fetched tokens are cached until shortly before they expire.
pub struct TokenSource {
    kind: Kind,
    cached: RwLock<Option<AccessToken>>,
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print tokens or key material
        f.debug_struct("TokenSource")
            .field("kind", &self.kind_name())
            .finish()
    }
}

impl TokenSource {
    fn with_kind(kind: Kind) -> Self {
        Self {
            kind,
            cached: RwLock::new(None),
        }
    }

    pub fn emulator() -> Self {
        Self::with_kind(Kind::Emulator)
    }

    pub fn fixed(token: impl Into<String>) -> Self {
        Self::with_kind(Kind::Static(token.into()))
    }

    pub fn metadata() -> Self {
        Self::metadata_at(METADATA_TOKEN_URL)
    }

    pub fn metadata_at(url: impl Into<String>) -> Self {
        Self::with_kind(Kind::Metadata { url: url.into() })
    }

    pub fn service_account(key: &ServiceAccountKey) -> StoreResult<Self> {
        if key.key_type != "service_account" {
            return Err(StoreError::Credentials(format!(
                "unsupported credentials type {:?}",
                key.key_type
            )));
        }

        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| StoreError::Credentials(format!("invalid service account key: {e}")))?;

        Ok(Self::with_kind(Kind::ServiceAccount {
            client_email: key.client_email.clone(),
            token_uri: key.token_uri.clone(),
            signing_key,
        }))
    }

    pub fn service_account_file(path: &Path) -> StoreResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        let key: ServiceAccountKey = serde_json::from_str(&raw).map_err(|e| {
            StoreError::Credentials(format!("cannot parse {}: {e}", path.display()))
        })?;

        Self::service_account(&key)
    }

    pub fn from_config(config: &Config) -> StoreResult<Self> {
        if config.firestore_emulator_host.is_some() {
            return Ok(Self::emulator());
        }
        if let Some(token) = &config.static_access_token {
            return Ok(Self::fixed(token.clone()));
        }
        if let Some(path) = &config.credentials_file {
            return Self::service_account_file(path);
        }
        Ok(Self::metadata())
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            Kind::Emulator => "emulator",
            Kind::Static(_) => "static",
            Kind::ServiceAccount { .. } => "service_account",
            Kind::Metadata { .. } => "metadata",
        }
    }

    pub async fn access_token(&self, http: &reqwest::Client) -> StoreResult<String> {
        match &self.kind {
            Kind::Emulator => return Ok("owner".to_string()),
            Kind::Static(token) => return Ok(token.clone()),
            _ => {}
        }

        let now = Utc::now();
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref()
                && token.expires_at > now
            {
                return Ok(token.value.clone());
            }
        }

        let mut cached = self.cached.write().await;
        if let Some(token) = cached.as_ref()
            && token.expires_at > now
        {
            return Ok(token.value.clone());
        }

        let fresh = self.fetch(http, now).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);

        Ok(value)
    }

    async fn fetch(&self, http: &reqwest::Client, now: DateTime<Utc>) -> StoreResult<AccessToken> {
        let request = match &self.kind {
            Kind::Metadata { url } => {
                debug!(url = %url, "fetching access token from metadata server");
                http.get(url).header("Metadata-Flavor", "Google")
            }
            Kind::ServiceAccount {
                client_email,
                token_uri,
                signing_key,
            } => {
                debug!(client_email = %client_email, "exchanging service account assertion");
                let claims = AssertionClaims {
                    iss: client_email,
                    scope: DATASTORE_SCOPE,
                    aud: token_uri,
                    iat: now.timestamp(),
                    exp: now.timestamp() + 3600,
                };
                let assertion =
                    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, signing_key)
                        .map_err(|e| StoreError::Credentials(format!("cannot sign assertion: {e}")))?;

                let body = url::form_urlencoded::Serializer::new(String::new())
                    .append_pair("grant_type", JWT_BEARER_GRANT)
                    .append_pair("assertion", &assertion)
                    .finish();

                http.post(token_uri)
                    .header(
                        reqwest::header::CONTENT_TYPE,
                        "application/x-www-form-urlencoded",
                    )
                    .body(body)
            }
            Kind::Emulator | Kind::Static(_) => {
                return Err(StoreError::Credentials(
                    "token source has nothing to fetch".to_string(),
                ));
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Credentials(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Credentials(format!(
                "token endpoint answered HTTP {status}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Credentials(format!("invalid token response: {e}")))?;

        Ok(AccessToken {
            value: token.access_token,
            expires_at: now + token_lifetime(token.expires_in),
        })
    }
}

/// How long a fetched token is reused: `expires_in` minus the refresh margin,
/// bounded to `0..=12h`.
fn token_lifetime(expires_in: i64) -> ChronoDuration {
    let seconds = expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECONDS) - EXPIRY_MARGIN_SECONDS;
    ChronoDuration::seconds(seconds.max(0))
}
