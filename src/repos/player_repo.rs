/*
 * Responsibility
 * - tables/{table}/players への player membership の追加 (append only)
 * - 重複チェックはしない: 同じ uid で何度 join しても毎回新しい document になる
 */
use serde_json::json;

use crate::api::dto::tables::TableId;
use crate::repos::error::RepoResult;
use crate::services::store::{CollectionPath, DocumentStore, Fields};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRow {
    pub id: String,
    pub collection: String,
    pub uid: String,
}

pub fn players_path(table: &TableId) -> String {
    format!("tables/{table}/players")
}

pub async fn add(store: &dyn DocumentStore, table: &TableId, uid: &str) -> RepoResult<PlayerRow> {
    let collection = CollectionPath::parse(&players_path(table))?;

    let mut fields = Fields::new();
    fields.insert("uid".to_string(), json!(uid));

    let id = store.add(&collection, &fields).await?;

    Ok(PlayerRow {
        id,
        collection: collection.to_string(),
        uid: uid.to_string(),
    })
}
