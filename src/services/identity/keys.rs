//! Public signing keys of the identity service, cached per `Cache-Control: max-age`.
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::DecodingKey;
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::services::identity::verifier::AuthError;

// Upper bound for how long a fetched key set is trusted, whatever the endpoint says.
const MAX_KEYS_TTL_SECONDS: u64 = 24 * 60 * 60;

/// JSON Web Key Set as served by the secure-token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
}

impl JwkSet {
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }

    pub fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let jwk = self
            .find(kid)
            .ok_or_else(|| AuthError::UnknownKey(Some(kid.to_string())))?;

        if jwk.kty != "RSA" {
            return Err(AuthError::UnsupportedAlgorithm(jwk.kty.clone()));
        }

        let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
            return Err(AuthError::KeyFetch(format!("key {kid} is missing n/e")));
        };

        Ok(DecodingKey::from_rsa_components(n, e)?)
    }
}

struct CachedKeys {
    keys: JwkSet,
    expires_at: DateTime<Utc>,
}

/// Process-wide cache of the identity service's public keys.
///
/// Readers share the lock; only a stale or empty cache takes the write path.
pub struct PublicKeyCache {
    http: reqwest::Client,
    url: String,
    fallback_ttl_seconds: u64,
    cached: RwLock<Option<CachedKeys>>,
}

impl PublicKeyCache {
    pub fn new(http: reqwest::Client, url: impl Into<String>, fallback_ttl_seconds: u64) -> Self {
        Self {
            http,
            url: url.into(),
            fallback_ttl_seconds,
            cached: RwLock::new(None),
        }
    }

    pub async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let now = Utc::now();

        {
            let cached = self.cached.read().await;
            if let Some(c) = cached.as_ref()
                && c.expires_at > now
            {
                return c.keys.decoding_key(kid);
            }
        }

        let mut cached = self.cached.write().await;

        // Another request may have refreshed while we waited for the write lock.
        if let Some(c) = cached.as_ref()
            && c.expires_at > now
        {
            return c.keys.decoding_key(kid);
        }

        let (keys, ttl_seconds) = self.fetch().await?;
        let key = keys.decoding_key(kid);

        *cached = Some(CachedKeys {
            keys,
            expires_at: now + cache_lifetime(ttl_seconds),
        });

        key
    }

    async fn fetch(&self) -> Result<(JwkSet, u64), AuthError> {
        debug!(url = %self.url, "fetching identity public keys");

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::KeyFetch(format!("HTTP {status}")));
        }

        let ttl_seconds = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(max_age)
            .unwrap_or(self.fallback_ttl_seconds);

        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::KeyFetch(format!("invalid key set: {e}")))?;

        Ok((keys, ttl_seconds))
    }
}

/// Key set lifetime, capped at one day.
pub fn cache_lifetime(ttl_seconds: u64) -> ChronoDuration {
    ChronoDuration::seconds(ttl_seconds.min(MAX_KEYS_TTL_SECONDS) as i64)
}

/// Extract `max-age` seconds from a `Cache-Control` value.
pub fn max_age(cache_control: &str) -> Option<u64> {
    cache_control.split(',').find_map(|directive| {
        let (name, value) = directive.trim().split_once('=')?;
        if name.trim().eq_ignore_ascii_case("max-age") {
            value.trim().trim_matches('"').parse().ok()
        } else {
            None
        }
    })
}
