// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::{auth::SharedSecret, relay::Relay, store::MemoryStore};

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

impl AppState {
    pub fn new(relay: Relay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(secret: Option<&str>) -> Self {
        Self::new(Relay::new(
            secret.map(SharedSecret::new),
            Arc::new(MemoryStore::new()),
        ))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::in_memory(None)
    }
}
