//! Remote catalog client for the todo API.
//!
//! # Design
//! `RemoteCatalog` is the seam the coordinator depends on; tests substitute
//! stubs and decorators behind it. `HttpCatalog` is the production
//! implementation: a thin reqwest wrapper holding only a shared client and
//! a `base_url`, carrying no state between calls. Non-2xx statuses are
//! returned as `SyncError::Network` with the status line and body so the
//! published error message has something actionable in it.

use async_trait::async_trait;

use crate::error::SyncError;
use crate::types::{Todo, TodoPage};

/// Catalog used when no explicit base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://dummyjson.com";

/// Read/write access to the remote todo catalog.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Fetches the full todo page via `GET /todos`.
    async fn fetch_todos(&self) -> Result<TodoPage, SyncError>;

    /// Pushes an updated todo via `PUT /todos/{id}` and returns the
    /// server's echo. Not used by the coordinator's flow, but part of the
    /// catalog contract.
    async fn push_todo(&self, id: i64, todo: &Todo) -> Result<Todo, SyncError>;
}

/// HTTP implementation of [`RemoteCatalog`].
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Turn a non-2xx response into a `Network` error carrying status and body.
    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::Network(format!("HTTP {status}: {body}")))
    }
}

impl Default for HttpCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl RemoteCatalog for HttpCatalog {
    async fn fetch_todos(&self) -> Result<TodoPage, SyncError> {
        let url = format!("{}/todos", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;
        Self::expect_success(response)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))
    }

    async fn push_todo(&self, id: i64, todo: &Todo) -> Result<Todo, SyncError> {
        let url = format!("{}/todos/{id}", self.base_url);
        let response = self
            .http
            .put(&url)
            .json(todo)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;
        Self::expect_success(response)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))
    }
}
