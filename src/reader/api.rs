//! The service surface as the reader components see it.
//!
//! [`HttpReaderApi`] talks to a running service over HTTP; an in-process
//! [`ArchiveService`] can be used directly as well.

use super::ReaderError;
use crate::archive::ArchiveService;
use crate::models::{MessageDetail, SearchResponse, ThreadsResponse};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[async_trait]
pub trait ReaderApi: Send + Sync {
    async fn threads(
        &self,
        list_id: &str,
        qdr: Option<&str>,
    ) -> Result<ThreadsResponse, ReaderError>;

    async fn message(&self, list_id: &str, hash: &str) -> Result<MessageDetail, ReaderError>;

    async fn search(
        &self,
        list_id: &str,
        query: &str,
        page: u32,
    ) -> Result<SearchResponse, ReaderError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// JSON client for the `/api` routes of a running service.
#[derive(Clone)]
pub struct HttpReaderApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpReaderApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url: String = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ReaderError> {
        let url = format!("{}/api{}", self.base_url, path);
        let response = self.http.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(ReaderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| ReaderError::Decode(err.to_string()))
    }
}

#[async_trait]
impl ReaderApi for HttpReaderApi {
    async fn threads(
        &self,
        list_id: &str,
        qdr: Option<&str>,
    ) -> Result<ThreadsResponse, ReaderError> {
        let query: Vec<(&str, &str)> = qdr.map(|qdr| ("qdr", qdr)).into_iter().collect();
        self.get_json(&format!("/threads/{list_id}"), &query).await
    }

    async fn message(&self, list_id: &str, hash: &str) -> Result<MessageDetail, ReaderError> {
        self.get_json(&format!("/messages/{list_id}/{hash}"), &[])
            .await
    }

    async fn search(
        &self,
        list_id: &str,
        query: &str,
        page: u32,
    ) -> Result<SearchResponse, ReaderError> {
        let page = page.to_string();
        self.get_json(
            "/search",
            &[("list", list_id), ("q", query), ("page", page.as_str())],
        )
        .await
    }
}

#[async_trait]
impl ReaderApi for ArchiveService {
    async fn threads(
        &self,
        list_id: &str,
        qdr: Option<&str>,
    ) -> Result<ThreadsResponse, ReaderError> {
        Ok(ArchiveService::threads(self, list_id, qdr).await)
    }

    async fn message(&self, list_id: &str, hash: &str) -> Result<MessageDetail, ReaderError> {
        Ok(ArchiveService::message(self, list_id, hash).await?)
    }

    async fn search(
        &self,
        list_id: &str,
        query: &str,
        page: u32,
    ) -> Result<SearchResponse, ReaderError> {
        Ok(ArchiveService::search(self, list_id, query, page).await?)
    }
}
