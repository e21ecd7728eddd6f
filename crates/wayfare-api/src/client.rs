//! HTTP collaborator for the Wayfare backend.
//!
//! Thin and deliberately dumb: every method is one endpoint, decodes the
//! `{success, data, error}` envelope and returns typed payloads.  Feed
//! semantics (mapping, merging, reconciliation) live in `wayfare-feed`.
//!
//! The bearer token is snapshotted from the [`TokenStore`] once per
//! request, and a 401 clears the store so a revoked credential is never
//! retried.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use wayfare_shared::{LikeReceipt, ReelId};

use crate::config::ApiConfig;
use crate::envelope::{CommentReceipt, Envelope, RawFeedPage};
use crate::error::ApiError;
use crate::token::TokenStore;

/// Shared handle to the backend.  Cheap to clone; clones reuse the same
/// connection pool and token store.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<ApiConfig>,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(config: ApiConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            config: Arc::new(config),
            tokens,
        })
    }

    /// Fetch one feed page.  `limit` is forwarded as-is; the backend
    /// clamps it to its own maximum.
    pub async fn fetch_reels(
        &self,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<RawFeedPage, ApiError> {
        let mut request = self
            .request(Method::GET, "/reels")
            .query(&[("limit", limit.to_string())]);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }
        debug!(limit, cursor = cursor.unwrap_or("-"), "fetching reels page");
        self.execute(request).await
    }

    /// Fetch one reel's full record, untyped for the mapper.
    pub async fn fetch_reel(&self, id: &ReelId) -> Result<Value, ApiError> {
        let request = self.request(Method::GET, &format!("/reels/{id}"));
        self.execute(request).await
    }

    /// Toggle the viewer's like on a reel.  The receipt carries the
    /// authoritative count and flag.
    pub async fn toggle_like(&self, id: &ReelId) -> Result<LikeReceipt, ApiError> {
        let request = self.request(Method::POST, &format!("/reels/{id}/like"));
        debug!(reel = %id.short(), "sending like toggle");
        self.execute(request).await
    }

    /// Create a comment on a reel.
    pub async fn post_comment(
        &self,
        id: &ReelId,
        content: &str,
    ) -> Result<CommentReceipt, ApiError> {
        let request = self
            .request(Method::POST, &format!("/reels/{id}/comment"))
            .json(&serde_json::json!({ "content": content }));
        debug!(reel = %id.short(), "posting comment");
        self.execute(request).await
    }

    /// Record that the viewer watched a reel.  The updated count in the
    /// response is irrelevant to the client and dropped.
    pub async fn record_view(&self, id: &ReelId) -> Result<(), ApiError> {
        let request = self.request(Method::POST, &format!("/reels/{id}/view"));
        self.execute::<Value>(request).await.map(|_| ())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self.http.request(method, self.config.endpoint(path));
        // One token snapshot per request: a mid-flight sign-out never
        // produces a half-authenticated call.
        if let Some(token) = self.tokens.load() {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.tokens.clear();
            warn!("backend rejected the auth token, cleared stored credential");
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Http { status });
        }

        let body = response.text().await?;
        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| ApiError::Envelope(e.to_string()))?;
        envelope.into_data()
    }
}
