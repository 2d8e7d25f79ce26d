use super::{UpstreamError, UpstreamRequest};
use crate::config::ReaderConfig;
use async_trait::async_trait;
use std::time::Duration;

/// Anything that can answer archive GET requests with a text body.
///
/// Implementations do not retry; callers decide how to treat failures.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    async fn fetch_text(&self, request: &UpstreamRequest) -> Result<String, UpstreamError>;
}

/// HTTP gateway to the archive host.
#[derive(Clone)]
pub struct ArchiveClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ArchiveClient {
    pub fn new(config: &ReaderConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout.min(Duration::from_secs(10)))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn classify(&self, url: String, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout {
                url,
                timeout: self.timeout,
            }
        } else if let Some(status) = err.status() {
            UpstreamError::Status {
                status: status.as_u16(),
                url,
            }
        } else {
            UpstreamError::Transport {
                url,
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl ArchiveSource for ArchiveClient {
    async fn fetch_text(&self, request: &UpstreamRequest) -> Result<String, UpstreamError> {
        let url = format!("{}{}", self.base_url, request.path);
        let display_url = format!("{}{}", self.base_url, request);

        let response = self
            .http
            .get(&url)
            .query(&request.query)
            .send()
            .await
            .map_err(|err| self.classify(display_url.clone(), err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                url: display_url,
            });
        }

        response
            .text()
            .await
            .map_err(|err| self.classify(display_url, err))
    }
}
