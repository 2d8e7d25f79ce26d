//! Archive service: cached, parsed views over the upstream archive.

pub mod error;
pub mod service;

pub use error::ArchiveError;
pub use service::ArchiveService;
