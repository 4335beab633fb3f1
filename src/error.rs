// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relay error taxonomy.
//!
//! Every failure inside the relay is one of these variants. They are turned
//! into a [`RelayResponse`] in exactly one place (`Relay::handle`), so no
//! error ever escapes the request boundary.

use std::collections::BTreeMap;

use axum::http::{header::ALLOW, StatusCode};

use crate::{models::RelayResponse, store::StoreError};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// No shared secret configured. Fails closed.
    #[error("Server misconfigured")]
    Configuration,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Missing key")]
    MissingKey,

    /// Body absent or not parseable. `reason` is for logs only.
    #[error("Invalid JSON")]
    InvalidJson { reason: String },

    #[error("Not found")]
    NotFound,

    #[error("Method Not Allowed")]
    MethodNotAllowed(String),

    #[error("Internal Server Error: {0}")]
    Store(#[from] StoreError),
}

impl RelayError {
    /// Stable identifier used in log fields.
    pub fn error_code(&self) -> &'static str {
        match self {
            RelayError::Configuration => "configuration_error",
            RelayError::Unauthorized => "unauthorized",
            RelayError::MissingKey => "missing_key",
            RelayError::InvalidJson { .. } => "invalid_json",
            RelayError::NotFound => "not_found",
            RelayError::MethodNotAllowed(_) => "method_not_allowed",
            RelayError::Store(StoreError::InvalidKey(_)) => "invalid_key",
            RelayError::Store(_) => "store_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
            RelayError::MissingKey | RelayError::InvalidJson { .. } => StatusCode::BAD_REQUEST,
            RelayError::NotFound => StatusCode::NOT_FOUND,
            RelayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::Store(StoreError::InvalidKey(_)) => StatusCode::BAD_REQUEST,
            RelayError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> String {
        match self {
            // The store refused the key before any I/O; that is the caller's fault.
            RelayError::Store(StoreError::InvalidKey(_)) => "Bad Request".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<RelayError> for RelayResponse {
    fn from(err: RelayError) -> Self {
        let mut response = RelayResponse::text(err.status_code(), err.body());
        if let RelayError::MethodNotAllowed(_) = err {
            let mut headers = BTreeMap::new();
            headers.insert(ALLOW.as_str().to_string(), "GET, POST".to_string());
            response.headers = Some(headers);
        }
        response
    }
}
