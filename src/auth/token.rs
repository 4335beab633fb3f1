// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token extraction and comparison.

use std::{collections::HashMap, fmt};

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::RelayError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the caller's credential.
pub const TOKEN_HEADER: &str = "x-aurore-token";

/// The relay's shared secret.
///
/// Candidates are MACed under the secret itself and checked against the
/// MAC of the secret, so the final comparison is over fixed-length digests
/// and runs in constant time regardless of the candidate's length.
#[derive(Clone)]
pub struct SharedSecret {
    keyed: HmacSha256,
    expected: Vec<u8>,
}

impl SharedSecret {
    pub fn new(secret: &str) -> Self {
        // HMAC accepts keys of any length.
        let keyed = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
            .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts any key length"));
        let mut mac = keyed.clone();
        mac.update(secret.as_bytes());
        let expected = mac.finalize().into_bytes().to_vec();
        Self { keyed, expected }
    }

    /// Byte-exact, constant-time comparison.
    pub fn matches(&self, candidate: &str) -> bool {
        let mut mac = self.keyed.clone();
        mac.update(candidate.as_bytes());
        mac.verify_slice(&self.expected).is_ok()
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// Look up a header by name, ignoring ASCII case.
///
/// An exact match on `name` wins. Otherwise, when several casings are
/// present, the lexicographically smallest key is used so the result does
/// not depend on map iteration order.
pub fn header_value<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    if let Some(value) = headers.get(name) {
        return Some(value.as_str());
    }
    headers
        .iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case(name))
        .min_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, value)| value.as_str())
}

/// Check the `x-aurore-token` header against the configured secret.
pub fn verify_token(
    secret: &SharedSecret,
    headers: &HashMap<String, String>,
) -> Result<(), RelayError> {
    match header_value(headers, TOKEN_HEADER) {
        Some(token) if !token.is_empty() && secret.matches(token) => Ok(()),
        _ => Err(RelayError::Unauthorized),
    }
}
