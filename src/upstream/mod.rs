//! Upstream archive gateway: request descriptions, failure taxonomy and the
//! HTTP client that talks to the archive host.

pub mod client;
pub mod error;
pub mod request;

pub use client::{ArchiveClient, ArchiveSource};
pub use error::UpstreamError;
pub use request::{ListingView, UpstreamRequest};
