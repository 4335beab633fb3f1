// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Aurore Blobs Relay - Authenticated key-value relay
//!
//! Authorizes each caller with a shared secret sent in `x-aurore-token`,
//! then performs exactly one GET (read by key) or POST (write under key)
//! against a backing key-value store and maps the outcome to an HTTP status.
//!
//! ## Modules
//!
//! - `relay` - the request pipeline (`Relay::handle`)
//! - `auth` - token lookup and constant-time comparison
//! - `store` - the store capability and its memory / Netlify backends
//! - `api` - HTTP transport (Axum)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod relay;
pub mod state;
pub mod store;
