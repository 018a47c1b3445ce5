/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - identity: ID token verifier, store: document store
 * - Clone 前提で持つ (内部は Arc、起動時に一度だけ生成して使い回す)
 */
use std::sync::Arc;

use crate::services::{identity::IdentityVerifier, store::DocumentStore};

#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityVerifier>,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(identity: Arc<dyn IdentityVerifier>, store: Arc<dyn DocumentStore>) -> Self {
        Self { identity, store }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("identity", &self.identity.backend_name())
            .field("store", &self.store.backend_name())
            .finish()
    }
}
