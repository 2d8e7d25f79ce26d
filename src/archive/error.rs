use crate::upstream::UpstreamError;
use thiserror::Error;

/// Failures of single-entity archive lookups (message detail, search).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("message {hash} not found in list {list_id}")]
    NotFound { list_id: String, hash: String },
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}
