use crate::archive::ArchiveError;
use thiserror::Error;

/// Failures seen by the client-side reader components.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// A newer request superseded this one. Never shown to the reader.
    #[error("request was superseded")]
    Canceled,
}

impl ReaderError {
    pub fn is_canceled(&self) -> bool {
        matches!(self, ReaderError::Canceled)
    }
}
