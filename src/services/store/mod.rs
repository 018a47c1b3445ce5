pub mod client;
pub mod credentials;
pub mod factory;
pub mod firestore;
pub mod memory;

pub use client::{CollectionPath, DocumentStore, Fields, StoreError, StoreResult};
pub use credentials::TokenSource;
pub use factory::build_document_store;
pub use firestore::FirestoreClient;
pub use memory::{MemoryStore, StoredDocument};
