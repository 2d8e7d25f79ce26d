use super::{ReaderApi, ReaderError};
use crate::models::Thread;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadListState {
    pub list_id: String,
    pub qdr: Option<String>,
    pub threads: Vec<Thread>,
    pub has_more: bool,
    pub loading: bool,
    /// Message shown next to a retry action; cleared by the next refresh.
    pub error: Option<String>,
}

/// Thread list of the active mailing list.
pub struct ThreadListLoader {
    api: Arc<dyn ReaderApi>,
    in_flight: Mutex<Option<CancellationToken>>,
    state: watch::Sender<ThreadListState>,
}

impl ThreadListLoader {
    pub fn new(api: Arc<dyn ReaderApi>, list_id: impl Into<String>) -> Self {
        let (state, _) = watch::channel(ThreadListState {
            list_id: list_id.into(),
            ..ThreadListState::default()
        });
        Self {
            api,
            in_flight: Mutex::new(None),
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ThreadListState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ThreadListState {
        self.state.borrow().clone()
    }

    /// Switch to another list, dropping the current threads and any refetch.
    pub fn select_list(&self, list_id: impl Into<String>) {
        self.cancel();
        self.state.send_replace(ThreadListState {
            list_id: list_id.into(),
            ..ThreadListState::default()
        });
    }

    pub fn cancel(&self) {
        let previous = self.in_flight.lock().take();
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    /// Fetch the thread list for the active list, superseding any refetch
    /// still in flight. Calling it again after an error is the retry.
    pub async fn refresh(&self, qdr: Option<&str>) {
        let list_id = self.state.borrow().list_id.clone();
        if list_id.is_empty() {
            return;
        }

        let token = CancellationToken::new();
        let previous = self.in_flight.lock().replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        let qdr = qdr.map(str::trim).filter(|value| !value.is_empty());
        self.state.send_modify(|state| {
            state.qdr = qdr.map(str::to_string);
            state.loading = true;
            state.error = None;
        });

        let outcome = tokio::select! {
            _ = token.cancelled() => Err(ReaderError::Canceled),
            result = self.api.threads(&list_id, qdr) => result,
        };
        if token.is_cancelled() {
            return;
        }

        match outcome {
            Ok(response) => self.state.send_modify(|state| {
                state.threads = response.threads;
                state.has_more = response.has_more;
                state.loading = false;
            }),
            Err(err) if err.is_canceled() => {}
            Err(err) => {
                log::warn!("failed to load threads for {}: {}", list_id, err);
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(err.to_string());
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ThreadsResponse;
    use crate::test_support::{FakeReaderApi, thread_of};

    fn threads(ids: &[&str]) -> ThreadsResponse {
        ThreadsResponse {
            threads: ids
                .iter()
                .map(|id| thread_of(id, &[format!("{id}-root")]))
                .collect(),
            has_more: true,
        }
    }

    #[tokio::test]
    async fn test_refresh_publishes_threads() {
        let api = Arc::new(FakeReaderApi::new().with_threads("tls", threads(&["A", "B"])));
        let loader = ThreadListLoader::new(api.clone(), "tls");

        loader.refresh(Some(" 1w ")).await;

        let state = loader.snapshot();
        assert_eq!(state.threads.len(), 2);
        assert!(state.has_more);
        assert!(!state.loading);
        assert_eq!(state.qdr.as_deref(), Some("1w"));
        assert_eq!(api.calls(), vec!["threads:tls:1w".to_string()]);
    }

    #[tokio::test]
    async fn test_error_then_retry() {
        let api = Arc::new(FakeReaderApi::new());
        let loader = ThreadListLoader::new(api.clone(), "tls");

        loader.refresh(None).await;
        let failed = loader.snapshot();
        assert!(failed.error.is_some());
        assert!(!failed.loading);

        api.put_threads("tls", threads(&["A"]));
        loader.refresh(None).await;
        let retried = loader.snapshot();
        assert!(retried.error.is_none());
        assert_eq!(retried.threads.len(), 1);
    }

    #[tokio::test]
    async fn test_superseded_refresh_publishes_nothing() {
        let api = Arc::new(FakeReaderApi::new().with_threads("tls", threads(&["A"])));
        let gate = api.gate("threads:tls:1w");
        let loader = Arc::new(ThreadListLoader::new(api.clone(), "tls"));

        let first = tokio::spawn({
            let loader = loader.clone();
            async move { loader.refresh(Some("1w")).await }
        });
        while api.call_count("threads:tls:1w") == 0 {
            tokio::task::yield_now().await;
        }

        loader.select_list("quic");
        first.await.expect("first refresh task");
        gate.notify_one();

        let state = loader.snapshot();
        assert_eq!(state.list_id, "quic");
        assert!(state.threads.is_empty());
        assert!(!state.loading);
    }
}
