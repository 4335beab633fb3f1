// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{RelayEvent, RelayResponse, WriteRequest},
    state::AppState,
};

pub mod blobs;
pub mod health;

/// Path the original function was deployed under; kept for existing callers.
pub const FUNCTION_PATH: &str = "/.netlify/functions/blobs-proxy";

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route(FUNCTION_PATH, any(blobs::relay_http))
        .route("/blobs", any(blobs::relay_http))
        .route("/invoke", post(blobs::invoke))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

/// Last-resort 500 for a panicking handler.
fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Request handler panicked");
    RelayResponse::text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

#[derive(OpenApi)]
#[openapi(
    paths(
        blobs::relay_http,
        blobs::invoke,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            RelayEvent,
            RelayResponse,
            WriteRequest,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Blobs", description = "Authenticated key-value relay"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
