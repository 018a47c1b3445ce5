//! Document store interface used by the repos.
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Top-level fields of a document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer errors (path/transport/remote rejection).
///
/// Note:
/// - We keep this independent from `AppError`; repos wrap it and the handler
///   decides the HTTP status.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid collection path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("invalid store endpoint: {0}")]
    Endpoint(String),
    #[error("store transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected store response: {0}")]
    InvalidResponse(String),
    #[error("store credentials error: {0}")]
    Credentials(String),
}

/// Slash-separated path naming a collection (`a`, `a/b/c`, ...).
///
/// Same shape rules as the managed SDK: no `//`, odd number of segments.
/// Leading/trailing slashes are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let invalid = |reason| StoreError::InvalidPath {
            path: raw.to_string(),
            reason,
        };

        if raw.contains("//") {
            return Err(invalid("paths must not contain //"));
        }

        let segments: Vec<String> = raw
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if segments.is_empty() {
            return Err(invalid("path is empty"));
        }
        if segments.len() % 2 == 0 {
            return Err(invalid("a collection path needs an odd number of segments"));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// A minimal document store interface.
///
/// Only append is needed: records are never read back, updated or deleted.
/// Implementations are shared process-wide (`Arc<dyn DocumentStore>`).
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    // Returns the store backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // Append a new document to `collection`. The store assigns the id.
    //
    // Returns the assigned document id.
    async fn add(&self, collection: &CollectionPath, fields: &Fields) -> StoreResult<String>;
}
