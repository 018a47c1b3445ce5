/*
 * Responsibility
 * - /joinTable: 認証済み uid を tables/{table}/players に追加する
 * - token 検証は middleware (access) 側、ここでは AuthCtx を受け取るだけ
 * - 成功時は明示的に 200 + 空 body を返す
 */
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};

use crate::{
    api::{dto::tables::JoinTableRequest, extractors::AuthCtxExtractor},
    error::AppError,
    repos::player_repo,
    state::AppState,
};

pub async fn join_table(
    State(state): State<AppState>,
    AuthCtxExtractor(auth): AuthCtxExtractor,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let req = JoinTableRequest::from_body(content_type, &body)
        .map_err(|e| AppError::bad_request("INVALID_BODY", e.to_string()))?;

    let row = player_repo::add(state.store.as_ref(), &req.table, &auth.uid).await?;

    tracing::info!(
        uid = %row.uid,
        email = auth.email.as_deref().unwrap_or("-"),
        provider = auth.sign_in_provider.as_deref().unwrap_or("-"),
        collection = %row.collection,
        document_id = %row.id,
        "player joined table"
    );

    Ok(StatusCode::OK)
}
