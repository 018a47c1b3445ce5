//! ID token 検証 → AuthCtx を extensions に入れる
//!
//! - `Authorization` ヘッダを 1 文字のスペースで split し、2 番目を token 候補とする
//!   (scheme は見ない。ヘッダ無し / 2 番目が無い場合は空文字)
//! - 候補をそのまま identity service に渡す。空文字も含めて判定は verifier 側
//! - 失敗時は 401、handler は呼ばれない

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// 認証が必要な route に access middleware を適用する。
///
/// 例：
/// ```ignore
/// let join = Router::new().route("/joinTable", any(join_table));
/// let join = middleware::auth::access::apply(join, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

/// Token candidate from the `authorization` header (`""` when absent or malformed).
pub fn bearer_candidate(headers: &HeaderMap) -> &str {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(' ').nth(1))
        .unwrap_or("")
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_candidate(req.headers()).to_owned();

    let identity = match state.identity.verify(&token).await {
        Ok(identity) => identity,
        Err(err) => {
            tracing::warn!(
                error = %err,
                verifier = state.identity.backend_name(),
                "id token verification failed"
            );
            return Err(AppError::Unauthorized);
        }
    };

    tracing::debug!(uid = %identity.uid, "id token verified");

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::from(identity));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with(value: &'static [u8]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(value).unwrap(),
        );
        headers
    }

    #[test]
    fn takes_second_space_separated_token() {
        assert_eq!(bearer_candidate(&headers_with(b"Bearer abc.def.ghi")), "abc.def.ghi");
        assert_eq!(bearer_candidate(&headers_with(b"Token abc")), "abc");
        assert_eq!(bearer_candidate(&headers_with(b"Bearer a b")), "a");
    }

    #[test]
    fn missing_or_malformed_header_yields_empty() {
        assert_eq!(bearer_candidate(&HeaderMap::new()), "");
        assert_eq!(bearer_candidate(&headers_with(b"Bearer")), "");
        assert_eq!(bearer_candidate(&headers_with(b"Bearer  abc")), "");
        assert_eq!(bearer_candidate(&headers_with(b"Bearer \xff\xfe")), "");
    }
}
