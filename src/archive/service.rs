use super::ArchiveError;
use crate::cache::{
    ArchiveCache, Clock, SystemClock, lists_key, message_key, search_key, threads_key,
};
use crate::catalog::CURATED_LISTS;
use crate::config::{CacheTtls, ReaderConfig, ThreadPolicy};
use crate::models::{
    ListsResponse, MailingList, MessageDetail, MessageRow, SearchResponse, SearchResult,
    ThreadsResponse,
};
use crate::parser::{parse_listing, parse_message_detail};
use crate::threading::{build_threads, merge_pages};
use crate::upstream::{ArchiveSource, UpstreamRequest};
use futures_util::future::join_all;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct MessageCounts {
    #[serde(default)]
    msg_counts: HashMap<String, u64>,
}

/// Cached, parsed access to the upstream archive.
///
/// Thread lists tolerate partial upstream failure; single-message and search
/// lookups report it.
pub struct ArchiveService {
    source: Arc<dyn ArchiveSource>,
    cache: ArchiveCache,
    ttls: CacheTtls,
    thread_policy: ThreadPolicy,
}

impl ArchiveService {
    pub fn new(source: Arc<dyn ArchiveSource>, config: &ReaderConfig) -> Self {
        Self::with_clock(source, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        source: Arc<dyn ArchiveSource>,
        config: &ReaderConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            cache: ArchiveCache::new(clock),
            ttls: config.cache_ttls,
            thread_policy: config.thread_policy,
        }
    }

    /// Curated lists with their archived message counts.
    ///
    /// A count that cannot be fetched is reported as 0.
    pub async fn lists(&self) -> ListsResponse {
        let key = lists_key();
        if let Some(cached) = self.cache.lists.get(&key) {
            return cached;
        }

        let counts = join_all(CURATED_LISTS.iter().map(|seed| self.message_count(seed.id))).await;

        let lists: Vec<MailingList> = CURATED_LISTS
            .iter()
            .zip(counts)
            .map(|(seed, message_count)| MailingList {
                id: seed.id.to_string(),
                name: seed.name.to_string(),
                description: seed.description.to_string(),
                area: seed.area.to_string(),
                active: seed.active,
                message_count,
            })
            .collect();

        let mut areas: Vec<String> = lists.iter().map(|list| list.area.clone()).collect();
        areas.sort();
        areas.dedup();

        let response = ListsResponse { lists, areas };
        self.cache.lists.set(key, response.clone(), self.ttls.lists);
        response
    }

    async fn message_count(&self, list_id: &str) -> u64 {
        let request = UpstreamRequest::message_counts(list_id);
        let body = match self.source.fetch_text(&request).await {
            Ok(body) => body,
            Err(err) => {
                log::warn!("message count for list {} unavailable: {}", list_id, err);
                return 0;
            }
        };

        match serde_json::from_str::<MessageCounts>(&body) {
            Ok(counts) => counts.msg_counts.get(list_id).copied().unwrap_or(0),
            Err(err) => {
                log::warn!("malformed message count payload for list {}: {}", list_id, err);
                0
            }
        }
    }

    /// Reconstruct the active threads of a list.
    ///
    /// Five listing pages are fetched concurrently. Pages that fail are
    /// skipped; if no page yields a row the result is empty and is not
    /// cached, so the next call tries again.
    pub async fn threads(&self, list_id: &str, qdr: Option<&str>) -> ThreadsResponse {
        let qdr = qdr.map(str::trim).filter(|value| !value.is_empty());
        let key = threads_key(list_id, qdr);
        if let Some(cached) = self.cache.threads.get(&key) {
            log::debug!("cache hit: {}", key);
            return cached;
        }

        let requests = UpstreamRequest::thread_window(list_id, qdr);
        // join_all yields outcomes in request order regardless of completion order.
        let pages = join_all(requests.iter().map(|request| self.fetch_rows(request))).await;
        let fetched = pages.iter().filter(|page| page.is_some()).count();

        let rows = merge_pages(pages.into_iter().flatten());
        if rows.is_empty() {
            log::warn!(
                "list {}: no rows from {}/{} listing pages",
                list_id,
                fetched,
                requests.len()
            );
            return ThreadsResponse::default();
        }

        let row_count = rows.len();
        let threads = build_threads(rows, list_id, &self.thread_policy);
        log::info!(
            "list {}: {} threads from {} unique rows ({}/{} pages)",
            list_id,
            threads.len(),
            row_count,
            fetched,
            requests.len()
        );

        let response = ThreadsResponse {
            threads,
            has_more: true,
        };
        self.cache.threads.set(key, response.clone(), self.ttls.threads);
        response
    }

    async fn fetch_rows(&self, request: &UpstreamRequest) -> Option<Vec<MessageRow>> {
        match self.source.fetch_text(request).await {
            Ok(html) => Some(parse_listing(&html).rows),
            Err(err) => {
                log::warn!("listing page {} skipped: {}", request, err);
                None
            }
        }
    }

    /// Full detail of one message. Archived messages never change, so a
    /// fetched detail is cached for the long message TTL.
    pub async fn message(&self, list_id: &str, hash: &str) -> Result<MessageDetail, ArchiveError> {
        let key = message_key(list_id, hash);
        if let Some(cached) = self.cache.messages.get(&key) {
            return Ok(cached);
        }

        let request = UpstreamRequest::message(list_id, hash);
        let html = self.source.fetch_text(&request).await.map_err(|err| {
            if err.is_not_found() {
                ArchiveError::NotFound {
                    list_id: list_id.to_string(),
                    hash: hash.to_string(),
                }
            } else {
                ArchiveError::Upstream(err)
            }
        })?;

        let detail = parse_message_detail(hash, &html);
        self.cache
            .messages
            .set(key, detail.clone(), self.ttls.messages);
        Ok(detail)
    }

    /// Free-text search within one list. An empty query or list returns no
    /// results without contacting the archive.
    pub async fn search(
        &self,
        list_id: &str,
        query: &str,
        page: u32,
    ) -> Result<SearchResponse, ArchiveError> {
        if query.is_empty() || list_id.is_empty() {
            return Ok(SearchResponse {
                results: Vec::new(),
                query: query.to_string(),
                has_more: false,
            });
        }

        let page = page.max(1);
        let key = search_key(list_id, query, page);
        if let Some(cached) = self.cache.search.get(&key) {
            return Ok(cached);
        }

        let html = self
            .source
            .fetch_text(&UpstreamRequest::search(list_id, query, page))
            .await?;
        let listing = parse_listing(&html);

        let results = listing
            .rows
            .into_iter()
            .map(|row| SearchResult {
                subject: row.subject,
                from: row.from,
                date: row.date,
                hash: row.hash,
                list: list_id.to_string(),
                thread_id: row.thread_id,
                depth: row.depth,
            })
            .collect();

        let response = SearchResponse {
            results,
            query: query.to_string(),
            has_more: listing.has_next,
        };
        self.cache.search.set(key, response.clone(), self.ttls.search);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::test_support::{FakeArchive, detail_html, listing_html, row};
    use std::time::Duration;

    fn service_with(fake: Arc<FakeArchive>) -> (ArchiveService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let config = ReaderConfig::from_lookup(|_| None);
        let service = ArchiveService::with_clock(fake, &config, clock.clone());
        (service, clock)
    }

    #[tokio::test]
    async fn test_threads_survive_partial_failure() {
        let fake = Arc::new(
            FakeArchive::new()
                .with_page(
                    "/arch/browse/tls/",
                    listing_html(&[row("a1", "A", 0, "2024-05-02"), row("b1", "B", 0, "2024-05-01")]),
                )
                .with_failure("/arch/browse/tls/?page=2", 503)
                .with_page(
                    "/arch/browse/tls/?gbt=1",
                    listing_html(&[row("a1", "A", 0, "2024-05-02"), row("a2", "A", 1, "2024-05-03")]),
                )
                .with_failure("/arch/browse/tls/?gbt=1&page=2", 429),
        );
        let (service, _clock) = service_with(fake.clone());

        let response = service.threads("tls", None).await;
        assert!(response.has_more);
        assert_eq!(response.threads.len(), 2);
        assert_eq!(response.threads[0].id, "A");
        assert_eq!(response.threads[0].messages.len(), 2);
        assert_eq!(response.threads[1].id, "B");
        assert_eq!(fake.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_total_failure_is_empty_and_uncached() {
        let fake = Arc::new(FakeArchive::new());
        let (service, _clock) = service_with(fake.clone());

        let first = service.threads("tls", Some("1d")).await;
        assert_eq!(first, ThreadsResponse::default());
        let _ = service.threads("tls", Some("1d")).await;
        assert_eq!(fake.calls().len(), 10);
        assert!(fake.calls().iter().all(|call| call.contains("qdr=1d")));
    }

    #[tokio::test]
    async fn test_threads_cached_until_ttl() {
        let fake = Arc::new(FakeArchive::new().with_page(
            "/arch/browse/tls/",
            listing_html(&[row("a1", "A", 0, "2024-05-02")]),
        ));
        let (service, clock) = service_with(fake.clone());

        let first = service.threads("tls", None).await;
        clock.advance(Duration::from_secs(299));
        let second = service.threads("tls", None).await;
        assert_eq!(first, second);
        assert_eq!(fake.call_count("/arch/browse/tls/"), 1);

        clock.advance(Duration::from_secs(2));
        let _ = service.threads("tls", None).await;
        assert_eq!(fake.call_count("/arch/browse/tls/"), 2);
    }

    #[tokio::test]
    async fn test_message_detail_is_cached() {
        let detail = MessageDetail {
            hash: "h1".to_string(),
            subject: "[TLS] ECH".to_string(),
            from: crate::models::Sender {
                name: "Alice".to_string(),
                email: Some("alice@example.org".to_string()),
            },
            date: "2024-05-01".to_string(),
            body: "hello".to_string(),
            thread_snippet: Vec::new(),
        };
        let fake = Arc::new(FakeArchive::new().with_page("/arch/msg/tls/h1/", detail_html(&detail)));
        let (service, _clock) = service_with(fake.clone());

        let fetched = service.message("tls", "h1").await.expect("detail");
        assert_eq!(fetched, detail);
        let _ = service.message("tls", "h1").await.expect("cached detail");
        assert_eq!(fake.call_count("/arch/msg/tls/h1/"), 1);
    }

    #[tokio::test]
    async fn test_message_failures_are_classified() {
        let fake = Arc::new(FakeArchive::new().with_failure("/arch/msg/tls/boom/", 500));
        let (service, _clock) = service_with(fake);

        let missing = service.message("tls", "gone").await.unwrap_err();
        assert!(matches!(missing, ArchiveError::NotFound { .. }));

        let failed = service.message("tls", "boom").await.unwrap_err();
        assert!(matches!(
            failed,
            ArchiveError::Upstream(crate::upstream::UpstreamError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_search_skips_upstream() {
        let fake = Arc::new(FakeArchive::new());
        let (service, _clock) = service_with(fake.clone());

        let response = service.search("tls", "", 1).await.expect("empty search");
        assert!(response.results.is_empty());
        assert!(!response.has_more);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_maps_rows() {
        let fake = Arc::new(FakeArchive::new().with_page(
            "/arch/browse/tls/?q=ech&page=1",
            listing_html(&[row("s1", "T9", 1, "2024-04-01")]),
        ));
        let (service, _clock) = service_with(fake);

        let response = service.search("tls", "ech", 0).await.expect("search");
        assert_eq!(response.query, "ech");
        assert_eq!(response.results.len(), 1);
        let hit = &response.results[0];
        assert_eq!(hit.hash, "s1");
        assert_eq!(hit.list, "tls");
        assert_eq!(hit.thread_id, "T9");
        assert_eq!(hit.depth, 1);
    }

    #[tokio::test]
    async fn test_lists_with_missing_counts() {
        let fake = Arc::new(
            FakeArchive::new()
                .with_page(
                    "/api/v1/stats/msg_counts/?list=tls&start=20000101&end=20271231",
                    r#"{"msg_counts": {"tls": 31337}}"#,
                )
                .with_page(
                    "/api/v1/stats/msg_counts/?list=quic&start=20000101&end=20271231",
                    "not json",
                ),
        );
        let (service, _clock) = service_with(fake.clone());

        let response = service.lists().await;
        assert_eq!(response.lists.len(), CURATED_LISTS.len());
        let count_of = |id: &str| {
            response
                .lists
                .iter()
                .find(|list| list.id == id)
                .map(|list| list.message_count)
        };
        assert_eq!(count_of("tls"), Some(31337));
        assert_eq!(count_of("quic"), Some(0));
        assert_eq!(count_of("mls"), Some(0));

        let mut sorted = response.areas.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(response.areas, sorted);
        assert!(response.areas.contains(&"Security".to_string()));

        let _ = service.lists().await;
        assert_eq!(fake.calls().len(), CURATED_LISTS.len());
    }
}
