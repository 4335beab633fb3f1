// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Netlify Blobs REST API client.
//!
//! Blobs live at `{api_base}/sites/{site_id}/blobs/{store_name}/{key}` and
//! are read with `GET` and replaced with `PUT`, authenticated by a bearer
//! access token.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{BlobStore, StoreError, StoredValue};
use crate::config::NetlifyConfig;

/// Upstream error bodies are cut to this many characters.
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Clone)]
pub struct NetlifyBlobStore {
    base_url: Url,
    site_id: String,
    store_name: String,
    access_token: String,
    http: Client,
}

impl fmt::Debug for NetlifyBlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetlifyBlobStore")
            .field("base_url", &self.base_url.as_str())
            .field("site_id", &self.site_id)
            .field("store_name", &self.store_name)
            .finish_non_exhaustive()
    }
}

impl NetlifyBlobStore {
    pub fn new(config: &NetlifyConfig) -> Result<Self, StoreError> {
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|e| StoreError::Request(format!("invalid Netlify API base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Request(format!(
                "Netlify API base URL cannot carry a path: {base_url}"
            )));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            site_id: config.site_id.clone(),
            store_name: config.store_name.clone(),
            access_token: config.access_token.clone(),
            http,
        })
    }

    /// URL of a single blob. The key is encoded as one path segment.
    fn blob_url(&self, key: &str) -> Result<Url, StoreError> {
        // Dot segments would be resolved away by the URL parser.
        if key == "." || key == ".." {
            return Err(StoreError::InvalidKey(format!("{key:?} is a dot segment")));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Request("Netlify API base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend([
                "sites",
                self.site_id.as_str(),
                "blobs",
                self.store_name.as_str(),
                key,
            ]);
        Ok(url)
    }
}

#[async_trait]
impl BlobStore for NetlifyBlobStore {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        let url = self.blob_url(key)?;
        debug!(store = %self.store_name, key, "Netlify Blobs GET");

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| StoreError::Request(format!("GET blob failed: {}", e.without_url())))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Request(format!("reading blob failed: {}", e.without_url())))?;
        Ok(Some(StoredValue::from_text(text)))
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let url = self.blob_url(key)?;
        let body =
            serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        debug!(store = %self.store_name, key, bytes = body.len(), "Netlify Blobs PUT");

        let response = self
            .http
            .put(url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::Request(format!("PUT blob failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "netlify"
    }
}

async fn upstream_error(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    StoreError::Upstream {
        status,
        body: truncate(&body, MAX_ERROR_BODY_CHARS),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
