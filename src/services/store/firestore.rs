use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use crate::services::store::client::{CollectionPath, DocumentStore, Fields, StoreError, StoreResult};
use crate::services::store::credentials::TokenSource;

pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Cloud Firestore client (REST v1, `createDocument` only).
///
/// Document ids are assigned server-side; we read them back from the returned `name`.
pub struct FirestoreClient {
    http: reqwest::Client,
    documents_root: Url,
    credentials: TokenSource,
}

impl std::fmt::Debug for FirestoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreClient")
            .field("documents_root", &self.documents_root.as_str())
            .field("credentials", &self.credentials)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CreatedDocument {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    message: String,
}

impl FirestoreClient {
    /// `base_url` is the API root, e.g. `https://firestore.googleapis.com/v1`
    /// or `http://localhost:8080/v1` for the emulator.
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        project_id: &str,
        credentials: TokenSource,
    ) -> StoreResult<Self> {
        let mut documents_root =
            Url::parse(base_url).map_err(|e| StoreError::Endpoint(format!("{base_url}: {e}")))?;

        documents_root
            .path_segments_mut()
            .map_err(|_| StoreError::Endpoint(format!("{base_url}: cannot be a base")))?
            .pop_if_empty()
            .extend([
                "projects",
                project_id,
                "databases",
                "(default)",
                "documents",
            ]);

        Ok(Self {
            http,
            documents_root,
            credentials,
        })
    }

    /// URL of a collection; every path segment is percent-encoded on its own.
    pub fn collection_url(&self, collection: &CollectionPath) -> StoreResult<Url> {
        let mut url = self.documents_root.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Endpoint(self.documents_root.to_string()))?
            .extend(collection.segments());
        Ok(url)
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    fn backend_name(&self) -> &'static str {
        "firestore"
    }

    async fn add(&self, collection: &CollectionPath, fields: &Fields) -> StoreResult<String> {
        let url = self.collection_url(collection)?;
        let token = self.credentials.access_token(&self.http).await?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "fields": encode_fields(fields) }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Prefer Google's error envelope; fall back to the status text.
            let message = match response.json::<GoogleErrorEnvelope>().await {
                Ok(envelope) => envelope.error.message,
                Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
            };
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let created: CreatedDocument = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        document_id(&created.name)
            .map(str::to_string)
            .ok_or_else(|| StoreError::InvalidResponse(format!("document name {:?}", created.name)))
    }
}

/// Last segment of a resource name (`projects/.../documents/tables/42/players/<id>`).
pub fn document_id(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|id| !id.is_empty())
}

/// Encode plain JSON fields as Firestore typed values.
pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        // int64 travels as a string in the REST encoding
        Value::Number(n) if n.is_i64() => json!({ "integerValue": n.to_string() }),
        Value::Number(n) => json!({ "doubleValue": n.as_f64() }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}
