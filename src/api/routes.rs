/*
 * Responsibility
 * - URL 構造を定義 (/helloWorld, /joinTable, /health)
 * - ID token が必要な範囲 (/joinTable のみ) に access middleware を route_layer で適用
 */
use axum::{
    Router,
    routing::{any, get},
};

use crate::api::handlers::{greeting::hello_world, health::health, tables::join_table};
use crate::middleware::auth::access;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let authenticated = access::apply(Router::new().route("/joinTable", any(join_table)), state);

    Router::new()
        .route("/helloWorld", any(hello_world))
        .route("/health", get(health))
        .merge(authenticated)
}
