use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::services::store::client::{CollectionPath, DocumentStore, Fields, StoreResult};

const AUTO_ID_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Fields,
}

/// In-process document store (local development / tests).
///
/// Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<StoredDocument>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents of one collection, in insertion order.
    pub async fn documents(&self, collection: &str) -> Vec<StoredDocument> {
        self.collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of documents across all collections.
    pub async fn len(&self) -> usize {
        self.collections.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn auto_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(AUTO_ID_LEN);
    id
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn add(&self, collection: &CollectionPath, fields: &Fields) -> StoreResult<String> {
        let id = auto_id();

        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(StoredDocument {
                id: id.clone(),
                fields: fields.clone(),
            });

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn uid_fields(uid: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("uid".into(), json!(uid));
        fields
    }

    #[tokio::test]
    async fn appends_with_fresh_ids() {
        let store = MemoryStore::new();
        let path = CollectionPath::parse("tables/42/players").unwrap();

        let first = store.add(&path, &uid_fields("u1")).await.unwrap();
        let second = store.add(&path, &uid_fields("u1")).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(first.len(), AUTO_ID_LEN);

        let docs = store.documents("tables/42/players").await;
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, first);
        assert_eq!(docs[1].fields["uid"], json!("u1"));
    }

    #[tokio::test]
    async fn collections_are_separate() {
        let store = MemoryStore::new();
        let a = CollectionPath::parse("tables/a/players").unwrap();
        let b = CollectionPath::parse("tables/b/players").unwrap();

        store.add(&a, &uid_fields("u1")).await.unwrap();
        store.add(&b, &uid_fields("u2")).await.unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(store.documents("tables/a/players").await.len(), 1);
        assert!(store.documents("tables/c/players").await.is_empty());
    }
}
