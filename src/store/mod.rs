// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Key-Value Store
//!
//! The relay talks to its backing store through [`BlobStore`], a narrow
//! `get` / `set` capability. Two backends exist:
//!
//! - [`MemoryStore`] - process-local map for tests and local development
//! - [`NetlifyBlobStore`] - Netlify Blobs REST API
//!
//! ## Semantics
//!
//! - `get` returns `Ok(None)` when the key is absent; absence is not an error
//! - `set` replaces any previous value unconditionally (last write wins)
//! - Values written as JSON read back as equivalent JSON

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde_json::Value;

use crate::config::StoreConfig;

pub mod memory;
pub mod netlify;

pub use memory::MemoryStore;
pub use netlify::NetlifyBlobStore;

/// A value read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    /// Structured JSON held in memory. Serialized on read.
    Json(Value),
    /// Text that is valid JSON, exactly as the store returned it.
    JsonText(String),
    /// Opaque text that is not JSON. Returned verbatim.
    Raw(String),
}

impl StoredValue {
    /// Classify a fetched payload without rewriting it.
    pub fn from_text(text: String) -> Self {
        if serde_json::from_str::<IgnoredAny>(&text).is_ok() {
            StoredValue::JsonText(text)
        } else {
            StoredValue::Raw(text)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(String),

    /// `body` goes to logs only; it never reaches the caller.
    #[error("store returned {status}")]
    Upstream { status: u16, body: String },

    #[error("store serialization failed: {0}")]
    Serialization(String),

    #[error("key cannot be stored: {0}")]
    InvalidKey(String),
}

/// Narrow key-value capability the relay depends on.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError>;

    async fn set(&self, key: &str, value: &Value) -> Result<(), StoreError>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}

/// Build the store selected by configuration.
pub fn from_config(config: &StoreConfig) -> Result<Arc<dyn BlobStore>, StoreError> {
    Ok(match config {
        StoreConfig::Memory => Arc::new(MemoryStore::new()),
        StoreConfig::Netlify(netlify) => Arc::new(NetlifyBlobStore::new(netlify)?),
    })
}
