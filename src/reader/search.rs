//! Debounced search-as-you-type.

use super::{ReaderApi, ReaderError};
use crate::models::SearchResult;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPolicy {
    pub debounce: Duration,
    /// Shorter queries clear the results without a request.
    pub min_query_chars: usize,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(400),
            min_query_chars: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub list_id: String,
    pub query: String,
    pub results: Vec<SearchResult>,
    pub searching: bool,
}

pub struct SearchOrchestrator {
    api: Arc<dyn ReaderApi>,
    policy: SearchPolicy,
    /// Bumped on every keystroke, list switch and clear.
    generation: AtomicU64,
    in_flight: Mutex<Option<CancellationToken>>,
    state: watch::Sender<SearchState>,
}

impl SearchOrchestrator {
    pub fn new(
        api: Arc<dyn ReaderApi>,
        list_id: impl Into<String>,
        policy: SearchPolicy,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(SearchState {
            list_id: list_id.into(),
            ..SearchState::default()
        });
        Arc::new(Self {
            api,
            policy,
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
            state,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Record a new query and schedule it after the debounce delay.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn search(self: &Arc<Self>, query: &str) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = query.to_string();

        if query.chars().count() < self.policy.min_query_chars {
            self.state.send_modify(|state| {
                state.query = query;
                state.results.clear();
                state.searching = false;
            });
            return;
        }

        self.state.send_modify(|state| {
            state.query = query.clone();
            state.searching = true;
        });

        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(this.policy.debounce).await;
            this.run(generation, query).await;
        });
    }

    /// Reset query and results and drop any pending search.
    pub fn clear(&self) {
        self.invalidate();
        self.state.send_modify(|state| {
            state.query.clear();
            state.results.clear();
            state.searching = false;
        });
    }

    /// Switch lists; results from the previous list are dropped at once.
    pub fn set_list(&self, list_id: impl Into<String>) {
        self.invalidate();
        self.state.send_replace(SearchState {
            list_id: list_id.into(),
            ..SearchState::default()
        });
    }

    fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let previous = self.in_flight.lock().take();
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn run(&self, generation: u64, query: String) {
        if !self.is_current(generation) {
            return;
        }

        let token = CancellationToken::new();
        let previous = self.in_flight.lock().replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        let list_id = self.state.borrow().list_id.clone();
        let outcome = tokio::select! {
            _ = token.cancelled() => Err(ReaderError::Canceled),
            result = self.api.search(&list_id, &query, 1) => result,
        };

        if token.is_cancelled() || !self.is_current(generation) {
            log::debug!("search '{}' superseded", query);
            return;
        }

        let results = match outcome {
            Ok(response) => response.results,
            Err(err) if err.is_canceled() => return,
            Err(err) => {
                log::warn!("search '{}' in list {} failed: {}", query, list_id, err);
                Vec::new()
            }
        };

        self.state.send_modify(|state| {
            state.results = results;
            state.searching = false;
        });
    }
}
