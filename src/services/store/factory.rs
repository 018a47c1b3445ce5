/// Factory: build the process-wide `DocumentStore` from application `Config`.
use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use crate::services::store::{
    DocumentStore, FirestoreClient, MemoryStore, StoreResult, TokenSource,
    firestore::FIRESTORE_BASE_URL,
};

pub fn build_document_store(
    config: &Config,
    http: reqwest::Client,
) -> StoreResult<Arc<dyn DocumentStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("memory store configured: player records are not persisted");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Firestore => {
            let base_url = firestore_base_url(config);
            let credentials = TokenSource::from_config(config)?;

            tracing::info!(
                base_url = %base_url,
                credentials = credentials.kind_name(),
                "firestore client configured"
            );

            let client = FirestoreClient::new(http, &base_url, &config.project_id, credentials)?;
            Ok(Arc::new(client))
        }
    }
}

/// API root: the emulator (plain HTTP) when `FIRESTORE_EMULATOR_HOST` is set.
pub fn firestore_base_url(config: &Config) -> String {
    match &config.firestore_emulator_host {
        Some(host) => format!("http://{host}/v1"),
        None => FIRESTORE_BASE_URL.to_string(),
    }
}
