// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 HIT Platform

//! Token claims: unverified local decoding and verified remote results.
//!
//! [`decode_unverified`] performs no signature check. It exists only to pick
//! cache keys and routing hints before the authoritative provisioner call,
//! and its output must never satisfy an authorization decision by itself.
//! The type split between [`UnverifiedClaims`] and [`VerifiedClaims`]
//! enforces that: only the provisioner verification path constructs
//! [`VerifiedClaims`].

use base64::{engine::general_purpose::URL_SAFE, Engine};
use serde_json::{Map, Value};

/// Claim key carrying the project slug in service tokens.
pub const PROJECT_CLAIM: &str = "prj";

/// Claim key carrying the service name in service tokens.
pub const SERVICE_CLAIM: &str = "svc";

/// Claims decoded locally from a token payload, without signature
/// verification. Advisory only.
#[derive(Debug, Clone, PartialEq)]
pub struct UnverifiedClaims(Map<String, Value>);

impl UnverifiedClaims {
    /// Look up a claim value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The `prj` claim, when present as a string.
    pub fn project_slug(&self) -> Option<&str> {
        self.0.get(PROJECT_CLAIM).and_then(Value::as_str)
    }

    /// The `svc` claim, when present as a string.
    pub fn service_name(&self) -> Option<&str> {
        self.0.get(SERVICE_CLAIM).and_then(Value::as_str)
    }

    /// Whether both identity claims required for service-scoped operation
    /// are present.
    pub fn has_service_identity(&self) -> bool {
        self.project_slug().is_some() && self.service_name().is_some()
    }
}

/// Claims confirmed by the provisioner's authoritative verification.
///
/// Constructed only from a successful verification response, never from
/// local decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedClaims(Map<String, Value>);

impl VerifiedClaims {
    pub(crate) fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    /// Look up a claim value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The `prj` claim, when present as a string.
    pub fn project_slug(&self) -> Option<&str> {
        self.0.get(PROJECT_CLAIM).and_then(Value::as_str)
    }

    /// The `svc` claim, when present as a string.
    pub fn service_name(&self) -> Option<&str> {
        self.0.get(SERVICE_CLAIM).and_then(Value::as_str)
    }

    /// The underlying claims document.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Decode a token's payload segment without verifying its signature.
///
/// Splits the token on `.` and requires exactly three segments, base64url
/// decodes the middle segment (right-padded with `=` to a multiple of four),
/// then parses it as a JSON object. Any malformed input yields `None`.
pub fn decode_unverified(token: &str) -> Option<UnverifiedClaims> {
    let mut segments = token.split('.');
    let (_header, payload) = (segments.next()?, segments.next()?);
    let _signature = segments.next()?;
    if segments.next().is_some() {
        return None;
    }

    let mut padded = payload.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }

    let bytes = URL_SAFE.decode(padded.as_bytes()).ok()?;
    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(map) => Some(UnverifiedClaims(map)),
        _ => None,
    }
}
