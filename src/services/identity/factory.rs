/// Factory: build the process-wide `IdentityVerifier` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::identity::{
    FirebaseTokenVerifier, IdentityVerifier, PublicKeyCache, firebase::SECURE_TOKEN_JWKS_URL,
};

pub fn build_identity_verifier(config: &Config, http: reqwest::Client) -> Arc<dyn IdentityVerifier> {
    if let Some(host) = &config.auth_emulator_host {
        tracing::warn!(
            emulator = %host,
            "auth emulator configured: id token signatures are NOT verified"
        );
        return Arc::new(FirebaseTokenVerifier::emulator(
            &config.project_id,
            config.id_token_leeway_seconds,
        ));
    }

    let keys = PublicKeyCache::new(
        http,
        SECURE_TOKEN_JWKS_URL,
        config.public_keys_fallback_ttl_seconds,
    );

    Arc::new(FirebaseTokenVerifier::new(
        &config.project_id,
        keys,
        config.id_token_leeway_seconds,
    ))
}
