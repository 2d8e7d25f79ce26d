//! Incremental body loading for the selected thread.
//!
//! Every `load_thread` call bumps a generation counter and captures it. Each
//! asynchronous step re-checks that counter before publishing, so a slow
//! fetch for an earlier selection never overwrites a newer one.

use super::ReaderApi;
use crate::models::{MessageDetail, MessageSummary, Sender, SnippetEntry, Thread};
use dashmap::DashMap;
use futures_util::future::join_all;
use parking_lot::RwLock;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// How much of a large thread is loaded up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderPolicy {
    /// Threads longer than this only load their head and tail eagerly.
    pub collapse_threshold: usize,
    pub head: usize,
    pub tail: usize,
    /// Concurrent detail fetches per batch.
    pub batch_size: usize,
}

impl Default for LoaderPolicy {
    fn default() -> Self {
        Self {
            collapse_threshold: 15,
            head: 3,
            tail: 5,
            batch_size: 5,
        }
    }
}

impl LoaderPolicy {
    /// Positions hidden behind "show earlier" for a thread of `len` messages.
    pub fn hidden_range(&self, len: usize) -> Option<Range<usize>> {
        if len <= self.collapse_threshold {
            return None;
        }
        let end = len.saturating_sub(self.tail);
        (self.head < end).then_some(self.head..end)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Ready,
}

/// One message of the displayed thread, with its body once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedMessage {
    pub hash: String,
    pub subject: String,
    pub from: Sender,
    pub date: String,
    pub depth: u32,
    pub body: Option<String>,
}

impl LoadedMessage {
    fn enrich(&mut self, detail: &MessageDetail) {
        self.body = Some(detail.body.clone());
        if !detail.from.name.is_empty() {
            self.from = detail.from.clone();
        }
        if !detail.date.is_empty() {
            self.date = detail.date.clone();
        }
    }
}

impl From<&MessageSummary> for LoadedMessage {
    fn from(summary: &MessageSummary) -> Self {
        Self {
            hash: summary.hash.clone(),
            subject: summary.subject.clone(),
            from: summary.from.clone(),
            date: summary.date.clone(),
            depth: summary.depth,
            body: None,
        }
    }
}

impl From<&SnippetEntry> for LoadedMessage {
    fn from(entry: &SnippetEntry) -> Self {
        Self {
            hash: entry.hash.clone(),
            subject: entry.subject.clone(),
            from: entry.from.clone(),
            date: String::new(),
            depth: entry.depth,
            body: None,
        }
    }
}

/// What the presentation layer renders for the current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadView {
    pub phase: LoadPhase,
    pub thread_id: Option<String>,
    pub messages: Vec<LoadedMessage>,
    /// Set when the root message could not be fetched.
    pub error: Option<String>,
}

pub struct ThreadLoader {
    api: Arc<dyn ReaderApi>,
    list_id: RwLock<String>,
    policy: LoaderPolicy,
    generation: AtomicU64,
    bodies: DashMap<String, MessageDetail>,
    state: watch::Sender<ThreadView>,
}

impl ThreadLoader {
    pub fn new(api: Arc<dyn ReaderApi>, list_id: impl Into<String>, policy: LoaderPolicy) -> Self {
        let (state, _) = watch::channel(ThreadView::default());
        Self {
            api,
            list_id: RwLock::new(list_id.into()),
            policy,
            generation: AtomicU64::new(0),
            bodies: DashMap::new(),
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ThreadView> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ThreadView {
        self.state.borrow().clone()
    }

    /// Switch lists. Clears the view and invalidates work in flight.
    pub fn set_list(&self, list_id: impl Into<String>) {
        *self.list_id.write() = list_id.into();
        self.clear();
    }

    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(ThreadView::default());
    }

    /// Load `thread` into the view, superseding any earlier selection.
    pub async fn load_thread(&self, thread: &Thread) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let list_id = self.list_id.read().clone();

        let root_hash = Some(thread.root_hash.as_str())
            .filter(|hash| !hash.is_empty())
            .or_else(|| thread.messages.first().map(|message| message.hash.as_str()))
            .filter(|hash| !hash.is_empty())
            .map(str::to_string);

        let Some(root_hash) = root_hash else {
            self.publish(generation, |view| *view = ThreadView::default());
            return;
        };

        self.publish(generation, |view| {
            *view = ThreadView {
                phase: LoadPhase::Loading,
                thread_id: Some(thread.id.clone()),
                messages: Vec::new(),
                error: None,
            };
        });

        let cached_root = self.cached_body(&root_hash);
        let root = match cached_root {
            Some(detail) => Ok(detail),
            None => self.api.message(&list_id, &root_hash).await,
        };

        let root = match root {
            Ok(detail) => {
                self.bodies.insert(root_hash.clone(), detail.clone());
                detail
            }
            Err(err) => {
                log::warn!("thread {}: root {} unavailable: {}", thread.id, root_hash, err);
                let messages = self.enriched(thread.messages.iter().map(LoadedMessage::from));
                self.publish(generation, |view| {
                    view.phase = LoadPhase::Ready;
                    view.messages = messages;
                    view.error = Some(err.to_string());
                });
                return;
            }
        };

        if !self.is_current(generation) {
            return;
        }

        // A snippet with more than one entry is the authoritative membership.
        let messages = if root.thread_snippet.len() > 1 {
            self.enriched(root.thread_snippet.iter().map(LoadedMessage::from))
        } else {
            self.enriched(thread.messages.iter().map(LoadedMessage::from))
        };
        let to_fetch = self.eager_hashes(&messages, &root_hash);

        if !self.publish(generation, |view| view.messages = messages) {
            return;
        }

        log::debug!(
            "thread {}: eagerly loading {} bodies",
            thread.id,
            to_fetch.len()
        );
        if self.fetch_batches(generation, &list_id, to_fetch).await {
            self.publish(generation, |view| view.phase = LoadPhase::Ready);
        }
    }

    /// Fetch one body on demand, reusing the body cache.
    pub async fn load_message_body(&self, hash: &str) {
        let generation = self.generation.load(Ordering::SeqCst);

        if self.cached_body(hash).is_none() {
            let list_id = self.list_id.read().clone();
            match self.api.message(&list_id, hash).await {
                Ok(detail) => {
                    self.bodies.insert(hash.to_string(), detail);
                }
                Err(err) => {
                    log::warn!("message {} unavailable: {}", hash, err);
                    return;
                }
            }
        }

        self.publish(generation, |view| self.enrich_all(&mut view.messages));
    }

    /// Fetch the given bodies in batches for the current selection.
    pub async fn load_bodies(&self, hashes: &[String]) {
        let generation = self.generation.load(Ordering::SeqCst);
        let list_id = self.list_id.read().clone();

        let to_fetch: Vec<String> = hashes
            .iter()
            .filter(|hash| !self.bodies.contains_key(hash.as_str()))
            .cloned()
            .collect();

        self.fetch_batches(generation, &list_id, to_fetch).await;
    }

    /// Load the middle of a collapsed thread.
    pub async fn show_earlier(&self) {
        let hidden: Vec<String> = {
            let view = self.state.borrow();
            match self.policy.hidden_range(view.messages.len()) {
                Some(range) => view.messages[range]
                    .iter()
                    .map(|message| message.hash.clone())
                    .collect(),
                None => Vec::new(),
            }
        };

        if !hidden.is_empty() {
            self.load_bodies(&hidden).await;
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Apply `update` only if `generation` is still the latest selection.
    fn publish(&self, generation: u64, update: impl FnOnce(&mut ThreadView)) -> bool {
        let mut applied = false;
        self.state.send_if_modified(|view| {
            if self.is_current(generation) {
                update(view);
                applied = true;
            }
            applied
        });
        applied
    }

    fn cached_body(&self, hash: &str) -> Option<MessageDetail> {
        self.bodies.get(hash).map(|entry| entry.value().clone())
    }

    fn enriched(&self, messages: impl Iterator<Item = LoadedMessage>) -> Vec<LoadedMessage> {
        let mut messages: Vec<LoadedMessage> = messages.collect();
        self.enrich_all(&mut messages);
        messages
    }

    fn enrich_all(&self, messages: &mut [LoadedMessage]) {
        for message in messages.iter_mut() {
            if let Some(detail) = self.bodies.get(&message.hash) {
                message.enrich(detail.value());
            }
        }
    }

    fn eager_hashes(&self, messages: &[LoadedMessage], root_hash: &str) -> Vec<String> {
        let hidden = self.policy.hidden_range(messages.len());
        let collapsed = messages.len() > self.policy.collapse_threshold;

        messages
            .iter()
            .enumerate()
            .filter(|(_, message)| message.body.is_none())
            .filter(|(index, message)| {
                if collapsed {
                    hidden.as_ref().is_none_or(|range| !range.contains(index))
                } else {
                    message.hash != root_hash
                }
            })
            .map(|(_, message)| message.hash.clone())
            .collect()
    }

    /// Returns false once the selection has been superseded.
    async fn fetch_batches(&self, generation: u64, list_id: &str, hashes: Vec<String>) -> bool {
        for batch in hashes.chunks(self.policy.batch_size.max(1)) {
            if !self.is_current(generation) {
                return false;
            }

            let outcomes = join_all(batch.iter().map(|hash| self.api.message(list_id, hash))).await;
            for (hash, outcome) in batch.iter().zip(outcomes) {
                match outcome {
                    Ok(detail) => {
                        self.bodies.insert(hash.clone(), detail);
                    }
                    Err(err) => log::debug!("body {} skipped: {}", hash, err),
                }
            }

            if !self.publish(generation, |view| self.enrich_all(&mut view.messages)) {
                return false;
            }
        }
        self.is_current(generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeReaderApi, detail, thread_of};

    fn loader(api: Arc<FakeReaderApi>) -> Arc<ThreadLoader> {
        Arc::new(ThreadLoader::new(api, "tls", LoaderPolicy::default()))
    }

    fn hashes(prefix: &str, count: usize) -> Vec<String> {
        (0..count).map(|index| format!("{prefix}{index}")).collect()
    }

    #[test]
    fn test_hidden_range() {
        let policy = LoaderPolicy::default();
        assert_eq!(policy.hidden_range(15), None);
        assert_eq!(policy.hidden_range(16), Some(3..11));
        assert_eq!(policy.hidden_range(20), Some(3..15));
    }

    #[tokio::test]
    async fn test_small_thread_loads_every_body() {
        let ids = hashes("s", 4);
        let api = Arc::new(
            FakeReaderApi::new()
                .with_detail(detail("s0", "Root", "body s0"))
                .with_detail(detail("s1", "Re: Root", "body s1"))
                .with_detail(detail("s3", "Re: Root", "body s3")),
        );
        let loader = loader(api.clone());

        loader.load_thread(&thread_of("S", &ids)).await;

        let view = loader.snapshot();
        assert_eq!(view.phase, LoadPhase::Ready);
        assert_eq!(view.thread_id.as_deref(), Some("S"));
        assert_eq!(view.messages.len(), 4);
        assert_eq!(view.messages[0].body.as_deref(), Some("body s0"));
        assert_eq!(view.messages[1].body.as_deref(), Some("body s1"));
        // s2 is missing upstream and stays a placeholder.
        assert_eq!(view.messages[2].body, None);
        assert_eq!(view.messages[3].body.as_deref(), Some("body s3"));
        assert_eq!(api.call_count("msg:s0"), 1);
        assert!(view.error.is_none());
    }

    #[tokio::test]
    async fn test_large_thread_loads_head_and_tail() {
        let ids = hashes("m", 20);
        let mut api = FakeReaderApi::new();
        for id in &ids {
            api = api.with_detail(detail(id, "Large", &format!("body {id}")));
        }
        let api = Arc::new(api);
        let loader = loader(api.clone());

        loader.load_thread(&thread_of("L", &ids)).await;

        let view = loader.snapshot();
        assert_eq!(view.phase, LoadPhase::Ready);
        for (index, message) in view.messages.iter().enumerate() {
            let eager = index < 3 || index >= 15;
            assert_eq!(message.body.is_some(), eager, "position {index}");
        }
        assert_eq!(api.calls().len(), 8);

        loader.show_earlier().await;

        let view = loader.snapshot();
        assert!(view.messages.iter().all(|message| message.body.is_some()));
        assert_eq!(api.calls().len(), 20);
    }

    #[tokio::test]
    async fn test_snippet_replaces_listing_messages() {
        let mut root = detail("r0", "[TLS] Root", "root body");
        root.thread_snippet = ["r0", "x1", "x2"]
            .iter()
            .enumerate()
            .map(|(depth, hash)| SnippetEntry {
                hash: hash.to_string(),
                subject: "Re: Root".to_string(),
                from: Sender::named("Someone"),
                depth: depth as u32,
                is_current: *hash == "r0",
            })
            .collect();
        let api = Arc::new(
            FakeReaderApi::new()
                .with_detail(root)
                .with_detail(detail("x1", "Re: Root", "one"))
                .with_detail(detail("x2", "Re: Root", "two")),
        );
        let loader = loader(api);

        loader
            .load_thread(&thread_of("R", &["r0".to_string(), "r1".to_string()]))
            .await;

        let view = loader.snapshot();
        let loaded: Vec<&str> = view.messages.iter().map(|m| m.hash.as_str()).collect();
        assert_eq!(loaded, vec!["r0", "x1", "x2"]);
        assert_eq!(view.messages[2].depth, 2);
        assert_eq!(view.messages[2].body.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_root_failure_keeps_listing_messages() {
        let api = Arc::new(FakeReaderApi::new().with_detail(detail("f1", "Reply", "reply")));
        let loader = loader(api);

        loader
            .load_thread(&thread_of("F", &["f0".to_string(), "f1".to_string()]))
            .await;

        let view = loader.snapshot();
        assert_eq!(view.phase, LoadPhase::Ready);
        assert_eq!(view.messages.len(), 2);
        assert!(view.error.is_some());
    }

    #[tokio::test]
    async fn test_thread_without_root_is_idle() {
        let api = Arc::new(FakeReaderApi::new());
        let loader = loader(api.clone());

        loader.load_thread(&thread_of("E", &[])).await;

        assert_eq!(loader.snapshot(), ThreadView::default());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_superseded_selection_never_publishes() {
        let api = Arc::new(
            FakeReaderApi::new()
                .with_detail(detail("a0", "Thread A", "a body"))
                .with_detail(detail("a1", "Re: Thread A", "a reply"))
                .with_detail(detail("b0", "Thread B", "b body"))
                .with_detail(detail("b1", "Re: Thread B", "b reply")),
        );
        let gate = api.gate("msg:a0");
        let loader = loader(api.clone());

        let first = tokio::spawn({
            let loader = loader.clone();
            let thread = thread_of("A", &hashes("a", 2));
            async move { loader.load_thread(&thread).await }
        });
        while api.call_count("msg:a0") == 0 {
            tokio::task::yield_now().await;
        }

        loader.load_thread(&thread_of("B", &hashes("b", 2))).await;
        gate.notify_one();
        first.await.expect("first load task");

        let view = loader.snapshot();
        assert_eq!(view.phase, LoadPhase::Ready);
        assert_eq!(view.thread_id.as_deref(), Some("B"));
        assert!(view.messages.iter().all(|m| m.hash.starts_with('b')));
        assert_eq!(api.call_count("msg:a1"), 0);
    }

    #[tokio::test]
    async fn test_on_demand_body_and_clear() {
        let ids = hashes("m", 20);
        let mut api = FakeReaderApi::new();
        for id in &ids {
            api = api.with_detail(detail(id, "Large", &format!("body {id}")));
        }
        let api = Arc::new(api);
        let loader = loader(api.clone());
        loader.load_thread(&thread_of("L", &ids)).await;

        loader.load_message_body("m7").await;
        let view = loader.snapshot();
        assert_eq!(view.messages[7].body.as_deref(), Some("body m7"));
        assert_eq!(view.messages[8].body, None);

        // Cached bodies are not fetched again.
        loader.load_message_body("m7").await;
        assert_eq!(api.call_count("msg:m7"), 1);

        loader.clear();
        assert_eq!(loader.snapshot(), ThreadView::default());
    }
}
