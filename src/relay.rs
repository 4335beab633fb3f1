// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authenticated KV Relay
//!
//! `handle(event) -> response`. Each invocation performs at most one store
//! operation and always produces exactly one response.
//!
//! ## Request Pipeline
//!
//! 1. No secret configured: 500, fail closed
//! 2. Method other than GET/POST: 405
//! 3. Token missing or wrong: 401 (nothing below runs)
//! 4. GET reads `key` from the query string; POST parses `{key, meta}` from
//!    the body
//! 5. One store call; its outcome is mapped to 200/201/404/500
//!
//! Steps 1-3 never touch the store or the body.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::{
    auth::{self, SharedSecret},
    error::RelayError,
    models::{RelayEvent, RelayResponse, CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT},
    store::{BlobStore, StoreError, StoredValue},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelayMethod {
    Get,
    Post,
}

impl RelayMethod {
    fn parse(raw: &str) -> Result<Self, RelayError> {
        if raw.eq_ignore_ascii_case("GET") {
            Ok(RelayMethod::Get)
        } else if raw.eq_ignore_ascii_case("POST") {
            Ok(RelayMethod::Post)
        } else {
            Err(RelayError::MethodNotAllowed(raw.to_string()))
        }
    }
}

/// Key and value extracted from a POST body.
#[derive(Debug, Clone, PartialEq)]
struct WriteCommand {
    key: String,
    meta: Value,
}

impl WriteCommand {
    fn parse(body: Option<&str>) -> Result<Self, RelayError> {
        let body = body.ok_or_else(|| RelayError::InvalidJson {
            reason: "request body is empty".to_string(),
        })?;
        let parsed: Value = serde_json::from_str(body).map_err(|e| RelayError::InvalidJson {
            reason: e.to_string(),
        })?;

        // A body that is valid JSON but not an object has no key.
        let Value::Object(mut fields) = parsed else {
            return Err(RelayError::MissingKey);
        };

        let key = match fields.remove("key") {
            Some(Value::String(key)) if !key.is_empty() => key,
            _ => return Err(RelayError::MissingKey),
        };
        let meta = fields
            .remove("meta")
            .unwrap_or_else(|| Value::Object(Map::new()));

        Ok(Self { key, meta })
    }
}

/// The relay: an optional secret and a store handle, both immutable.
pub struct Relay {
    secret: Option<SharedSecret>,
    store: Arc<dyn BlobStore>,
}

impl Relay {
    pub fn new(secret: Option<SharedSecret>, store: Arc<dyn BlobStore>) -> Self {
        Self { secret, store }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Handle one event. Never fails: every error becomes a response here.
    pub async fn handle(&self, event: &RelayEvent) -> RelayResponse {
        match self.dispatch(event).await {
            Ok(response) => response,
            Err(err) => {
                log_rejection(&event.http_method, &err);
                err.into()
            }
        }
    }

    async fn dispatch(&self, event: &RelayEvent) -> Result<RelayResponse, RelayError> {
        let secret = self.secret.as_ref().ok_or(RelayError::Configuration)?;
        let method = RelayMethod::parse(&event.http_method)?;
        auth::verify_token(secret, &event.headers)?;

        match method {
            RelayMethod::Get => self.read(event).await,
            RelayMethod::Post => self.write(event).await,
        }
    }

    async fn read(&self, event: &RelayEvent) -> Result<RelayResponse, RelayError> {
        let key = event
            .query_param("key")
            .filter(|key| !key.is_empty())
            .ok_or(RelayError::MissingKey)?;

        let value = self.store.get(key).await?.ok_or(RelayError::NotFound)?;
        debug!(key, backend = self.store.backend(), "Blob read");

        Ok(match value {
            StoredValue::Raw(text) | StoredValue::Json(Value::String(text)) => {
                RelayResponse::with_content_type(StatusCode::OK, CONTENT_TYPE_TEXT, text)
            }
            StoredValue::JsonText(text) => {
                RelayResponse::with_content_type(StatusCode::OK, CONTENT_TYPE_JSON, text)
            }
            StoredValue::Json(value) => RelayResponse::with_content_type(
                StatusCode::OK,
                CONTENT_TYPE_JSON,
                value.to_string(),
            ),
        })
    }

    async fn write(&self, event: &RelayEvent) -> Result<RelayResponse, RelayError> {
        let command = WriteCommand::parse(event.body.as_deref())?;
        self.store.set(&command.key, &command.meta).await?;
        info!(key = %command.key, backend = self.store.backend(), "Blob written");
        Ok(RelayResponse::text(StatusCode::CREATED, "OK"))
    }
}

fn log_rejection(method: &str, err: &RelayError) {
    let status = err.status_code().as_u16();
    let code = err.error_code();
    match err {
        RelayError::Configuration => {
            error!(method, status, code, "Relay secret is not configured")
        }
        RelayError::Store(StoreError::Upstream {
            status: upstream_status,
            body,
        }) => {
            error!(
                method,
                status,
                code,
                upstream_status,
                upstream_body = %body,
                "Store operation failed"
            )
        }
        RelayError::Store(store_err) => {
            error!(method, status, code, error = %store_err, "Store operation failed")
        }
        RelayError::Unauthorized | RelayError::MethodNotAllowed(_) => {
            warn!(method, status, code, "Request rejected")
        }
        RelayError::InvalidJson { reason } => {
            debug!(method, status, code, reason = %reason, "Request rejected")
        }
        RelayError::MissingKey | RelayError::NotFound => {
            debug!(method, status, code, "Request rejected")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use crate::{auth::TOKEN_HEADER, store::MemoryStore};

    const SECRET: &str = "aurore-test-secret";

    /// Memory store that counts every call.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        gets: AtomicUsize,
        sets: AtomicUsize,
    }

    impl CountingStore {
        fn calls(&self) -> usize {
            self.gets.load(Ordering::SeqCst) + self.sets.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BlobStore for CountingStore {
        async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &Value) -> Result<(), StoreError> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value).await
        }

        fn backend(&self) -> &'static str {
            "counting"
        }
    }

    struct FailingStore;

    #[async_trait]
    impl BlobStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<StoredValue>, StoreError> {
            Err(StoreError::Request("connection reset".into()))
        }

        async fn set(&self, _key: &str, _value: &Value) -> Result<(), StoreError> {
            Err(StoreError::Upstream {
                status: 503,
                body: "unavailable".into(),
            })
        }

        fn backend(&self) -> &'static str {
            "failing"
        }
    }

    fn relay_with(secret: Option<&str>) -> (Relay, Arc<CountingStore>) {
        let store = Arc::new(CountingStore::default());
        let relay = Relay::new(secret.map(SharedSecret::new), store.clone());
        (relay, store)
    }

    fn get(key: &str) -> RelayEvent {
        RelayEvent::new("GET")
            .with_header(TOKEN_HEADER, SECRET)
            .with_query("key", key)
    }

    fn post(body: &str) -> RelayEvent {
        RelayEvent::new("POST")
            .with_header(TOKEN_HEADER, SECRET)
            .with_body(body)
    }

    #[tokio::test]
    async fn wrong_or_missing_token_never_reaches_store() {
        let (relay, store) = relay_with(Some(SECRET));
        let events = [
            RelayEvent::new("GET").with_query("key", "k"),
            RelayEvent::new("GET")
                .with_header(TOKEN_HEADER, "wrong")
                .with_query("key", "k"),
            RelayEvent::new("POST")
                .with_header(TOKEN_HEADER, "")
                .with_body(r#"{"key":"k","meta":{}}"#),
            RelayEvent::new("POST")
                .with_header(TOKEN_HEADER, "wrong")
                .with_body("{not json"),
        ];

        for _ in 0..3 {
            for event in &events {
                let response = relay.handle(event).await;
                assert_eq!(response.status_code, 401);
                assert_eq!(response.body, "Unauthorized");
            }
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn missing_secret_fails_closed_for_every_request() {
        let (relay, store) = relay_with(None);
        assert!(!relay.is_configured());

        let events = [
            get("k"),
            post(r#"{"key":"k"}"#),
            RelayEvent::new("GET").with_query("key", "k"),
            RelayEvent::new("DELETE").with_header(TOKEN_HEADER, SECRET),
        ];
        for event in &events {
            let response = relay.handle(event).await;
            assert_eq!(response.status_code, 500);
            assert!(!response.body.contains(SECRET));
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn get_returns_value_written_by_post() {
        let (relay, _store) = relay_with(Some(SECRET));

        let created = relay.handle(&post(r#"{"key":"k","meta":{"a":1}}"#)).await;
        assert_eq!(created.status_code, 201);
        assert_eq!(created.body, "OK");

        let response = relay.handle(&get("k")).await;
        assert_eq!(response.status_code, 200);
        assert_eq!(response.header("content-type"), Some(CONTENT_TYPE_JSON));
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body, json!({"a": 1}));
    }

    #[tokio::test]
    async fn get_unknown_key_is_not_found() {
        let (relay, store) = relay_with(Some(SECRET));
        let response = relay.handle(&get("nonexistent")).await;
        assert_eq!(response.status_code, 404);
        assert_eq!(response.body, "Not found");
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn get_without_key_is_bad_request() {
        let (relay, store) = relay_with(Some(SECRET));
        let no_params = RelayEvent::new("GET").with_header(TOKEN_HEADER, SECRET);
        let empty_key = get("");

        for event in [no_params, empty_key] {
            let response = relay.handle(&event).await;
            assert_eq!(response.status_code, 400);
            assert_eq!(response.body, "Missing key");
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn get_returns_raw_text_unmodified() {
        let (relay, store) = relay_with(Some(SECRET));
        store
            .inner
            .insert("raw", StoredValue::Raw("line one\nline two".into()))
            .await;
        store
            .inner
            .insert("str", StoredValue::Json(Value::String("plain".into())))
            .await;

        let raw = relay.handle(&get("raw")).await;
        assert_eq!(raw.status_code, 200);
        assert_eq!(raw.body, "line one\nline two");
        assert_eq!(raw.header("content-type"), Some(CONTENT_TYPE_TEXT));

        let string = relay.handle(&get("str")).await;
        assert_eq!(string.body, "plain");
    }

    #[tokio::test]
    async fn get_returns_fetched_json_text_byte_for_byte() {
        let (relay, store) = relay_with(Some(SECRET));
        let stored = r#"{"b":1,"a":2.50, "n":12345678901234567890123}"#;
        store
            .inner
            .insert("k", StoredValue::from_text(stored.to_string()))
            .await;

        let response = relay.handle(&get("k")).await;
        assert_eq!(response.status_code, 200);
        assert_eq!(response.header("content-type"), Some(CONTENT_TYPE_JSON));
        assert_eq!(response.body, stored);
    }

    #[tokio::test]
    async fn post_without_key_leaves_store_untouched() {
        let (relay, store) = relay_with(Some(SECRET));
        for body in [
            r#"{"meta":{"x":1}}"#,
            r#"{"key":"","meta":{"x":1}}"#,
            r#"{"key":42}"#,
            r#"["key","meta"]"#,
        ] {
            let response = relay.handle(&post(body)).await;
            assert_eq!(response.status_code, 400, "body: {body}");
            assert_eq!(response.body, "Missing key");
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn post_overwrites_previous_value() {
        let (relay, store) = relay_with(Some(SECRET));
        relay
            .handle(&post(r#"{"key":"k","meta":{"v":"first"}}"#))
            .await;
        relay
            .handle(&post(r#"{"key":"k","meta":{"v":"second"}}"#))
            .await;

        assert_eq!(store.inner.len().await, 1);
        let response = relay.handle(&get("k")).await;
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body, json!({"v": "second"}));
    }

    #[tokio::test]
    async fn post_without_meta_stores_empty_object() {
        let (relay, store) = relay_with(Some(SECRET));
        let response = relay.handle(&post(r#"{"key":"k"}"#)).await;
        assert_eq!(response.status_code, 201);
        assert_eq!(
            store.inner.get("k").await.unwrap(),
            Some(StoredValue::Json(json!({})))
        );
    }

    #[tokio::test]
    async fn malformed_or_missing_body_is_invalid_json() {
        let (relay, store) = relay_with(Some(SECRET));

        let malformed = relay.handle(&post("{not json")).await;
        assert_eq!(malformed.status_code, 400);
        assert_eq!(malformed.body, "Invalid JSON");

        let no_body = RelayEvent::new("POST").with_header(TOKEN_HEADER, SECRET);
        let response = relay.handle(&no_body).await;
        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, "Invalid JSON");

        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn unsupported_methods_are_rejected_regardless_of_token() {
        let (relay, store) = relay_with(Some(SECRET));
        for method in ["DELETE", "PUT", "PATCH"] {
            let authorized = RelayEvent::new(method)
                .with_header(TOKEN_HEADER, SECRET)
                .with_query("key", "k")
                .with_body(r#"{"key":"k"}"#);
            let anonymous = RelayEvent::new(method);

            for event in [authorized, anonymous] {
                let response = relay.handle(&event).await;
                assert_eq!(response.status_code, 405);
                assert_eq!(response.header("allow"), Some("GET, POST"));
            }
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn token_header_name_is_case_insensitive() {
        let (relay, _store) = relay_with(Some(SECRET));
        relay.handle(&post(r#"{"key":"k","meta":1}"#)).await;

        let upper = RelayEvent::new("GET")
            .with_header("X-AURORE-TOKEN", SECRET)
            .with_query("key", "k");
        let lower = get("k");

        let upper_response = relay.handle(&upper).await;
        let lower_response = relay.handle(&lower).await;
        assert_eq!(upper_response.status_code, 200);
        assert_eq!(upper_response, lower_response);
    }

    #[tokio::test]
    async fn store_failures_become_internal_errors() {
        let relay = Relay::new(Some(SharedSecret::new(SECRET)), Arc::new(FailingStore));

        let read = relay.handle(&get("k")).await;
        assert_eq!(read.status_code, 500);
        assert!(read.body.contains("connection reset"));

        let write = relay.handle(&post(r#"{"key":"k"}"#)).await;
        assert_eq!(write.status_code, 500);
        assert!(write.body.contains("503"));
        assert!(!write.body.contains("unavailable"));
        assert!(!write.body.contains(SECRET));
    }

    #[test]
    fn write_command_keeps_explicit_null_meta() {
        let command = WriteCommand::parse(Some(r#"{"key":"k","meta":null}"#)).unwrap();
        assert_eq!(command.key, "k");
        assert_eq!(command.meta, Value::Null);
    }

    #[test]
    fn method_parsing_ignores_case() {
        assert_eq!(RelayMethod::parse("get").unwrap(), RelayMethod::Get);
        assert_eq!(RelayMethod::parse("Post").unwrap(), RelayMethod::Post);
        assert!(matches!(
            RelayMethod::parse("OPTIONS"),
            Err(RelayError::MethodNotAllowed(m)) if m == "OPTIONS"
        ));
    }
}
