/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - ID token の検証ロジックは middleware/services 側の責務
 */
use crate::services::identity::VerifiedIdentity;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `uid` は identity service が返す不透明なユーザーID（永続化されるのはこれだけ）
/// - `email` / `sign_in_provider` はログ相関用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub uid: String,
    pub email: Option<String>,
    pub sign_in_provider: Option<String>,
}

impl From<VerifiedIdentity> for AuthCtx {
    fn from(identity: VerifiedIdentity) -> Self {
        Self {
            uid: identity.uid,
            email: identity.email,
            sign_in_provider: identity.sign_in_provider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_log_fields_from_verified_identity() {
        let mut identity = VerifiedIdentity::new("u1", 1_700_000_000);
        identity.email = Some("u1@example.com".into());
        identity.sign_in_provider = Some("google.com".into());

        let ctx = AuthCtx::from(identity);

        assert_eq!(ctx.uid, "u1");
        assert_eq!(ctx.email.as_deref(), Some("u1@example.com"));
        assert_eq!(ctx.sign_in_provider.as_deref(), Some("google.com"));
    }
}
