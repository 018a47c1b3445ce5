/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 */
use thiserror::Error;

use crate::services::store::StoreError;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("store error")]
    Store(#[from] StoreError),
}

pub type RepoResult<T> = Result<T, RepoError>;
