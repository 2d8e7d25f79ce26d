//! Thread reconstruction from archive listing pages
//!
//! The archive exposes two listing views and neither is enough alone:
//!
//! 1. **Chronological**: accurate recency, but no thread context beyond the
//!    per-row thread id
//! 2. **Grouped by thread**: accurate grouping, but a single large thread can
//!    fill a whole page and hide recently active threads
//!
//! Rows from a few pages of both views are merged (deduplicated by message
//! hash, first page wins) and regrouped here.
//!
//! ## Module Structure
//!
//! - `merge`: order-preserving deduplication across pages
//! - `reconstruct`: grouping, root selection and ordering
//! - `subject`: list-tag stripping for display subjects

pub mod merge;
pub mod reconstruct;
pub mod subject;

pub use merge::merge_pages;
pub use reconstruct::{build_threads, select_root};
pub use subject::strip_list_tag;
