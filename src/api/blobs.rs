// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP entry points for the relay.
//!
//! Native requests are flattened into a [`RelayEvent`]; `/invoke` takes the
//! event JSON directly and answers with the response JSON.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{HeaderMap, Method},
    Json,
};

use crate::{
    models::{RelayEvent, RelayResponse, WriteRequest},
    state::AppState,
};

/// Relay a native HTTP request.
#[utoipa::path(
    method(get, post),
    path = "/.netlify/functions/blobs-proxy",
    params(
        ("x-aurore-token" = String, Header, description = "Shared secret"),
        ("key" = Option<String>, Query, description = "Key to read (GET only)")
    ),
    request_body(
        content = WriteRequest,
        content_type = "application/json",
        description = "Key and value to store (POST only)"
    ),
    tag = "Blobs",
    responses(
        (status = 200, description = "Stored value, JSON or raw text"),
        (status = 201, description = "Value stored", body = String),
        (status = 400, description = "Missing key or invalid JSON", body = String),
        (status = 401, description = "Missing or wrong token", body = String),
        (status = 404, description = "Key not found", body = String),
        (status = 405, description = "Method other than GET or POST", body = String),
        (status = 500, description = "Misconfiguration or store failure", body = String)
    )
)]
pub async fn relay_http(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> RelayResponse {
    let event = event_from_http(&method, &headers, query.as_deref(), &body);
    state.relay.handle(&event).await
}

/// Relay an event-shaped request, as a function runtime would deliver it.
#[utoipa::path(
    post,
    path = "/invoke",
    request_body = RelayEvent,
    tag = "Blobs",
    responses(
        (
            status = 200,
            description = "Relay outcome; the relay status is in `statusCode`",
            body = RelayResponse
        )
    )
)]
pub async fn invoke(
    State(state): State<AppState>,
    Json(event): Json<RelayEvent>,
) -> Json<RelayResponse> {
    Json(state.relay.handle(&event).await)
}

/// Flatten an HTTP request into a [`RelayEvent`].
///
/// Header values that are not valid UTF-8 are dropped, and a body that is
/// empty or not UTF-8 is treated as absent.
pub fn event_from_http(
    method: &Method,
    headers: &HeaderMap,
    query: Option<&str>,
    body: &[u8],
) -> RelayEvent {
    let mut header_map = HashMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            header_map
                .entry(name.as_str().to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    let query_string_parameters = query.map(|raw| {
        url::form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect::<HashMap<String, String>>()
    });

    let body = if body.is_empty() {
        None
    } else {
        String::from_utf8(body.to_vec()).ok()
    };

    RelayEvent {
        http_method: method.as_str().to_string(),
        headers: header_map,
        query_string_parameters,
        body,
    }
}
