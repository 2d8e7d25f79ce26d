pub mod archive;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod reader;
pub mod request_logger;
pub mod routes;
pub mod threading;
pub mod upstream;

use crate::archive::ArchiveService;
use crate::config::ReaderConfig;
use crate::request_logger::RequestLogger;
use crate::upstream::ArchiveClient;
use env_logger::Env;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use std::sync::{Arc, Once};

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    let config = ReaderConfig::from_env();
    let client = ArchiveClient::new(&config).expect("Failed to build archive HTTP client");
    log::info!(
        "reading archive at {} (timeout {:?})",
        client.base_url(),
        config.request_timeout
    );
    let archive = ArchiveService::new(Arc::new(client), &config);

    // Read-only API, so only GET is allowed cross-origin
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(vec![Method::Get].into_iter().map(From::from).collect())
        .to_cors()
        .expect("Error creating CORS");

    rocket::build()
        .attach(RequestLogger)
        .attach(cors)
        .manage(archive)
        .mount(
            "/api",
            openapi_get_routes![
                routes::health::health_check,
                routes::lists::list_mailing_lists,
                routes::threads::list_threads,
                routes::messages::get_message,
                routes::search::search_messages,
            ],
        )
        .mount(
            "/api/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("Archive Reader API", "../../openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use crate::archive::ArchiveService;
    use crate::config::ReaderConfig;
    use crate::models::{
        MessageDetail, MessageRow, MessageSummary, SearchResponse, SearchResult, Sender, Thread,
        ThreadsResponse,
    };
    use crate::reader::{ReaderApi, ReaderError};
    use crate::upstream::{ArchiveSource, UpstreamError, UpstreamRequest};
    use async_trait::async_trait;
    use dashmap::DashMap;
    use parking_lot::Mutex;
    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};
    use std::collections::HashMap;
    use std::fmt::Write as _;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Scripted archive host keyed by the rendered request target
    /// (`/arch/browse/tls/?gbt=1`). Unscripted targets answer 404.
    #[derive(Default)]
    pub struct FakeArchive {
        pages: HashMap<String, Result<String, u16>>,
        delays: HashMap<String, Duration>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeArchive {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_page(mut self, target: &str, body: impl Into<String>) -> Self {
            self.pages.insert(target.to_string(), Ok(body.into()));
            self
        }

        pub fn with_failure(mut self, target: &str, status: u16) -> Self {
            self.pages.insert(target.to_string(), Err(status));
            self
        }

        /// Hold the answer for `target` back by `delay`.
        pub fn with_delay(mut self, target: &str, delay: Duration) -> Self {
            self.delays.insert(target.to_string(), delay);
            self
        }

        /// Every requested target, in request order.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        pub fn call_count(&self, target: &str) -> usize {
            self.calls.lock().iter().filter(|call| *call == target).count()
        }
    }

    #[async_trait]
    impl ArchiveSource for FakeArchive {
        async fn fetch_text(&self, request: &UpstreamRequest) -> Result<String, UpstreamError> {
            let target = request.to_string();
            self.calls.lock().push(target.clone());

            if let Some(delay) = self.delays.get(&target) {
                tokio::time::sleep(*delay).await;
            }

            match self.pages.get(&target) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(UpstreamError::Status {
                    status: *status,
                    url: target,
                }),
                None => Err(UpstreamError::Status {
                    status: 404,
                    url: target,
                }),
            }
        }
    }

    /// Scripted service API for the reader components.
    ///
    /// Calls are logged as `msg:{hash}`, `threads:{list}:{qdr}` and
    /// `search:{list}:{query}`. A gated call blocks until its `Notify` fires.
    #[derive(Default)]
    pub struct FakeReaderApi {
        details: DashMap<String, MessageDetail>,
        threads: DashMap<String, ThreadsResponse>,
        searches: DashMap<String, SearchResponse>,
        gates: DashMap<String, Arc<Notify>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeReaderApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_detail(self, detail: MessageDetail) -> Self {
            self.details.insert(detail.hash.clone(), detail);
            self
        }

        pub fn with_threads(self, list_id: &str, response: ThreadsResponse) -> Self {
            self.put_threads(list_id, response);
            self
        }

        pub fn with_search(self, query: &str, response: SearchResponse) -> Self {
            self.searches.insert(query.to_string(), response);
            self
        }

        pub fn put_threads(&self, list_id: &str, response: ThreadsResponse) {
            self.threads.insert(list_id.to_string(), response);
        }

        /// Hold every call logged as `key` until the returned handle is notified.
        pub fn gate(&self, key: &str) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            self.gates.insert(key.to_string(), gate.clone());
            gate
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        pub fn call_count(&self, key: &str) -> usize {
            self.calls.lock().iter().filter(|call| *call == key).count()
        }

        async fn enter(&self, key: String) {
            self.calls.lock().push(key.clone());
            let gate = self.gates.get(&key).map(|gate| gate.value().clone());
            if let Some(gate) = gate {
                gate.notified().await;
            }
        }
    }

    #[async_trait]
    impl ReaderApi for FakeReaderApi {
        async fn threads(
            &self,
            list_id: &str,
            qdr: Option<&str>,
        ) -> Result<ThreadsResponse, ReaderError> {
            self.enter(format!("threads:{}:{}", list_id, qdr.unwrap_or_default()))
                .await;
            self.threads
                .get(list_id)
                .map(|entry| entry.value().clone())
                .ok_or_else(|| ReaderError::Status {
                    status: 502,
                    message: format!("no threads scripted for {list_id}"),
                })
        }

        async fn message(&self, _list_id: &str, hash: &str) -> Result<MessageDetail, ReaderError> {
            self.enter(format!("msg:{hash}")).await;
            self.details
                .get(hash)
                .map(|entry| entry.value().clone())
                .ok_or_else(|| ReaderError::Status {
                    status: 404,
                    message: format!("message {hash} not found"),
                })
        }

        async fn search(
            &self,
            list_id: &str,
            query: &str,
            _page: u32,
        ) -> Result<SearchResponse, ReaderError> {
            self.enter(format!("search:{list_id}:{query}")).await;
            self.searches
                .get(query)
                .map(|entry| entry.value().clone())
                .ok_or_else(|| ReaderError::Status {
                    status: 502,
                    message: format!("no results scripted for '{query}'"),
                })
        }
    }

    // ===== Fixtures =====

    pub fn row(hash: &str, thread_id: &str, depth: u32, date: &str) -> MessageRow {
        let subject = if depth == 0 {
            format!("[TLS] Topic {thread_id}")
        } else {
            format!("Re: [TLS] Topic {thread_id}")
        };
        MessageRow {
            hash: hash.to_string(),
            subject,
            from: format!("Author {hash}"),
            date: date.to_string(),
            thread_id: thread_id.to_string(),
            depth,
        }
    }

    pub fn detail(hash: &str, subject: &str, body: &str) -> MessageDetail {
        MessageDetail {
            hash: hash.to_string(),
            subject: subject.to_string(),
            from: Sender {
                name: format!("Author {hash}"),
                email: Some(format!("{hash}@example.org")),
            },
            date: "2024-05-01 10:00:00".to_string(),
            body: body.to_string(),
            thread_snippet: Vec::new(),
        }
    }

    /// A thread rooted at the first hash, one message per minute.
    pub fn thread_of(id: &str, hashes: &[String]) -> Thread {
        let messages: Vec<MessageSummary> = hashes
            .iter()
            .enumerate()
            .map(|(index, hash)| MessageSummary {
                hash: hash.clone(),
                subject: format!("Topic {id}"),
                from: Sender::named(format!("Author {hash}")),
                date: format!("2024-05-01 10:{:02}:00", index % 60),
                depth: u32::from(index > 0),
            })
            .collect();
        let first_date = messages.first().map(|m| m.date.clone()).unwrap_or_default();
        let last_date = messages.last().map(|m| m.date.clone()).unwrap_or_default();

        Thread {
            id: id.to_string(),
            subject: format!("Topic {id}"),
            from: messages.first().map(|m| m.from.clone()).unwrap_or_default(),
            date: first_date,
            last_activity: last_date,
            reply_count: messages.len().saturating_sub(1),
            hot: false,
            list: "tls".to_string(),
            root_hash: hashes.first().cloned().unwrap_or_default(),
            messages,
        }
    }

    pub fn search_hit(list_id: &str, hash: &str) -> SearchResult {
        SearchResult {
            subject: format!("Hit {hash}"),
            from: format!("Author {hash}"),
            date: "2024-04-01".to_string(),
            hash: hash.to_string(),
            list: list_id.to_string(),
            thread_id: format!("T-{hash}"),
            depth: 0,
        }
    }

    fn escape(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
    }

    /// Render rows the way the archive's browse view marks them up.
    pub fn listing_html(rows: &[MessageRow]) -> String {
        let mut html = String::from("<html><body><div class=\"xtbody\">\n");
        for row in rows {
            let _ = writeln!(
                html,
                "<div class=\"xtr\"><div class=\"subj-col depth-{}\"><a class=\"msg-detail\" href=\"/arch/msg/tls/{}/\">{}</a></div><div class=\"from-col\">{}</div><div class=\"date-col\">{}</div><div class=\"thread-col\">{}</div></div>",
                row.depth,
                escape(&row.hash),
                escape(&row.subject),
                escape(&row.from),
                escape(&row.date),
                escape(&row.thread_id),
            );
        }
        html.push_str("</div></body></html>");
        html
    }

    /// Render a detail page that parses back into `detail`.
    pub fn detail_html(detail: &MessageDetail) -> String {
        let from = match detail.from.email.as_deref() {
            Some(email) if !email.is_empty() => format!("{} <{}>", detail.from.name, email),
            _ => detail.from.name.clone(),
        };

        let mut html = String::from("<html><body>\n");
        let _ = writeln!(
            html,
            "<div id=\"msg-body\"><h3>{}</h3></div>",
            escape(&detail.subject)
        );
        let _ = writeln!(html, "<div id=\"msg-from\">{}</div>", escape(&from));
        let _ = writeln!(html, "<div id=\"msg-date\">{}</div>", escape(&detail.date));
        let _ = writeln!(
            html,
            "<div class=\"msg-payload\"><pre class=\"wordwrap\">{}</pre></div>",
            escape(&detail.body)
        );

        html.push_str("<ul class=\"thread-snippet\">\n");
        for entry in &detail.thread_snippet {
            let current = if entry.is_current { " current-msg" } else { "" };
            let _ = writeln!(
                html,
                "<li class=\"depth-{}{}\"><a href=\"/arch/msg/tls/{}/\">{}</a>&nbsp;&nbsp;{}</li>",
                entry.depth,
                current,
                escape(&entry.hash),
                escape(&entry.subject),
                escape(&entry.from.name),
            );
        }
        html.push_str("</ul>\n</body></html>");
        html
    }

    /// An archive service over `source` with default configuration.
    pub fn archive_service(source: Arc<dyn ArchiveSource>) -> ArchiveService {
        ArchiveService::new(source, &ReaderConfig::from_lookup(|_| None))
    }

    /// Builder for Rocket instances used in integration tests.
    pub struct TestRocketBuilder {
        figment: Figment,
        mounts: Vec<(String, Vec<Route>)>,
        archive: Option<ArchiveService>,
    }

    impl Default for TestRocketBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestRocketBuilder {
        /// Start a builder with sensible defaults: random port, logging disabled.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                mounts: Vec::new(),
                archive: None,
            }
        }

        /// Mount routes under `/api`.
        pub fn mount_api_routes(mut self, routes: Vec<Route>) -> Self {
            self.mounts.push(("/api".to_string(), routes));
            self
        }

        /// Manage an `ArchiveService` for routes that read the archive.
        pub fn manage_archive(mut self, archive: ArchiveService) -> Self {
            self.archive = Some(archive);
            self
        }

        /// Finish building the Rocket instance.
        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment);

            for (base, routes) in self.mounts {
                rocket = rocket.mount(base, routes);
            }

            if let Some(archive) = self.archive {
                rocket = rocket.manage(archive);
            }

            rocket
        }

        /// Convenience helper to produce a blocking local client.
        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        /// Convenience helper to produce an asynchronous local client.
        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }

}
