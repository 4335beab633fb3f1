// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Shared-secret authentication for the relay.
//!
//! ## Auth Flow
//!
//! 1. The caller sends `x-aurore-token: <secret>`
//! 2. The relay looks the header up case-insensitively
//! 3. The value is compared byte-for-byte, in constant time, against the
//!    secret loaded from `AURORE_BLOBS_TOKEN` at startup
//!
//! ## Security
//!
//! - The check runs before any store access or body parsing
//! - Neither the secret nor the supplied token is ever logged
//! - A missing secret is a configuration error, never a pass

pub mod token;

pub use token::{header_value, verify_token, SharedSecret, TOKEN_HEADER};
