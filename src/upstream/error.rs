use std::time::Duration;
use thiserror::Error;

/// Failures raised by the upstream gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("upstream returned status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("upstream request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("upstream request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

impl UpstreamError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, UpstreamError::Status { status: 404, .. })
    }
}
