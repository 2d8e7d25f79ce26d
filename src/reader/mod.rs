//! Client-side reader components.
//!
//! These drive the service API on behalf of a presentation layer: the
//! [`ThreadListLoader`] keeps the active list's threads, the
//! [`ThreadLoader`] reveals message bodies of the selected thread, and the
//! [`SearchOrchestrator`] runs debounced searches. Each publishes its state
//! through a `tokio::sync::watch` channel.

pub mod api;
pub mod error;
pub mod loader;
pub mod search;
pub mod thread_list;

pub use api::{HttpReaderApi, ReaderApi};
pub use error::ReaderError;
pub use loader::{LoadPhase, LoadedMessage, LoaderPolicy, ThreadLoader, ThreadView};
pub use search::{SearchOrchestrator, SearchPolicy, SearchState};
pub use thread_list::{ThreadListLoader, ThreadListState};
