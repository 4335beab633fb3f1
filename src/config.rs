// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`Config`] struct loaded
//! once at startup. Nothing in the request path reads the environment;
//! handlers receive everything through [`crate::state::AppState`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AURORE_BLOBS_TOKEN` | Shared secret expected in `x-aurore-token` | Unset: every relay request fails with 500 |
//! | `NETLIFY_SITE_ID` | Netlify site hosting the blob store | Unset: in-memory store |
//! | `NETLIFY_BLOBS_TOKEN` | Netlify API access token | Unset: in-memory store |
//! | `NETLIFY_BLOBS_STORE` | Blob store name | `aurore-memory` |
//! | `NETLIFY_API_BASE_URL` | Netlify API base URL | `https://api.netlify.com/api/v1` |
//! | `NETLIFY_BLOBS_TIMEOUT_SECS` | Store HTTP timeout in seconds | `15` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{fmt, net::SocketAddr, time::Duration};

use crate::auth::SharedSecret;

/// Shared secret compared against the `x-aurore-token` header.
pub const RELAY_TOKEN_ENV: &str = "AURORE_BLOBS_TOKEN";
pub const NETLIFY_SITE_ID_ENV: &str = "NETLIFY_SITE_ID";
pub const NETLIFY_BLOBS_TOKEN_ENV: &str = "NETLIFY_BLOBS_TOKEN";
pub const NETLIFY_BLOBS_STORE_ENV: &str = "NETLIFY_BLOBS_STORE";
pub const NETLIFY_API_BASE_URL_ENV: &str = "NETLIFY_API_BASE_URL";
pub const NETLIFY_BLOBS_TIMEOUT_ENV: &str = "NETLIFY_BLOBS_TIMEOUT_SECS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_STORE_NAME: &str = "aurore-memory";
pub const DEFAULT_NETLIFY_API_BASE_URL: &str = "https://api.netlify.com/api/v1";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Connection parameters for the Netlify Blobs REST API.
#[derive(Clone)]
pub struct NetlifyConfig {
    pub site_id: String,
    pub access_token: String,
    pub store_name: String,
    pub api_base_url: String,
    pub timeout: Duration,
}

impl fmt::Debug for NetlifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetlifyConfig")
            .field("site_id", &self.site_id)
            .field("access_token", &"<redacted>")
            .field("store_name", &self.store_name)
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Which store backs the relay.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// Process-local map. Used when Netlify credentials are absent.
    Memory,
    Netlify(NetlifyConfig),
}

/// Process-wide configuration, built once in `main`.
#[derive(Clone)]
pub struct Config {
    pub relay_token: Option<String>,
    pub store: StoreConfig,
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "relay_token",
                &self.relay_token.as_ref().map(|_| "<redacted>"),
            )
            .field("store", &self.store)
            .field("bind_addr", &self.bind_addr)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Blank values are treated the same as unset ones. Values are trimmed,
    /// except the relay secret, which is kept byte for byte.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let relay_token = lookup(RELAY_TOKEN_ENV).filter(|v| !v.trim().is_empty());

        let store = match (var(NETLIFY_SITE_ID_ENV), var(NETLIFY_BLOBS_TOKEN_ENV)) {
            (Some(site_id), Some(access_token)) => {
                let timeout_secs = match var(NETLIFY_BLOBS_TIMEOUT_ENV) {
                    Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                        name: NETLIFY_BLOBS_TIMEOUT_ENV,
                        value: raw.clone(),
                        reason: e.to_string(),
                    })?,
                    None => DEFAULT_STORE_TIMEOUT_SECS,
                };
                StoreConfig::Netlify(NetlifyConfig {
                    site_id,
                    access_token,
                    store_name: var(NETLIFY_BLOBS_STORE_ENV)
                        .unwrap_or_else(|| DEFAULT_STORE_NAME.to_string()),
                    api_base_url: var(NETLIFY_API_BASE_URL_ENV)
                        .unwrap_or_else(|| DEFAULT_NETLIFY_API_BASE_URL.to_string()),
                    timeout: Duration::from_secs(timeout_secs),
                })
            }
            _ => StoreConfig::Memory,
        };

        let host = var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match var(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    name: HOST_ENV,
                    value: host.clone(),
                    reason: e.to_string(),
                })?;

        let log_format = match var(LOG_FORMAT_ENV).map(|v| v.to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            relay_token,
            store,
            bind_addr,
            log_format,
        })
    }

    /// The relay secret, if one was configured.
    pub fn shared_secret(&self) -> Option<SharedSecret> {
        self.relay_token.as_deref().map(SharedSecret::new)
    }
}
