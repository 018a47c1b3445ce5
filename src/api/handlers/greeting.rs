/*
 * Responsibility
 * - /helloWorld: method / headers / body は見ない、常に 200 + 固定文字列
 */
use axum::http::StatusCode;

pub const GREETING: &str = "Hello from Firebase!";

pub async fn hello_world() -> (StatusCode, &'static str) {
    (StatusCode::OK, GREETING)
}
