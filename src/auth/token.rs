// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 HIT Platform

//! Bearer token extraction from inbound request headers.
//!
//! Precedence: the `X-HIT-Service-Token` header first, then
//! `Authorization: Bearer <token>`. The service token header is injected by
//! the trusted gateway and carries the `prj`/`svc` claims multi-tenant
//! routing needs; preferring it avoids misrouting configuration lookups when
//! both headers are present. Absence of any token is not an error at this
//! layer; callers decide whether that is fatal.

use axum::http::{header::AUTHORIZATION, HeaderMap};

/// Header injected by the trusted gateway, carrying the caller's service
/// token. Untrusted clients must never be able to set this directly.
pub const SERVICE_TOKEN_HEADER: &str = "x-hit-service-token";

/// Which header a token was pulled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// The dedicated `X-HIT-Service-Token` header.
    ServiceHeader,
    /// The standard `Authorization: Bearer` header.
    Authorization,
}

/// A token pulled from a request, with its originating header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractedToken<'a> {
    pub value: &'a str,
    pub source: TokenSource,
}

/// The raw service token header value, when present and non-empty.
pub fn service_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SERVICE_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// The `Authorization` header's bearer token, when present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Extract a candidate token with the defined header precedence.
pub fn extract(headers: &HeaderMap) -> Option<ExtractedToken<'_>> {
    if let Some(value) = service_token(headers) {
        return Some(ExtractedToken {
            value,
            source: TokenSource::ServiceHeader,
        });
    }
    bearer_token(headers).map(|value| ExtractedToken {
        value,
        source: TokenSource::Authorization,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(entries: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in entries {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn service_header_wins_over_authorization() {
        let map = headers(&[
            ("x-hit-service-token", "service-tok"),
            ("authorization", "Bearer user-tok"),
        ]);
        let extracted = extract(&map).unwrap();
        assert_eq!(extracted.value, "service-tok");
        assert_eq!(extracted.source, TokenSource::ServiceHeader);
    }

    #[test]
    fn bearer_prefix_is_stripped() {
        let map = headers(&[("authorization", "Bearer abc123")]);
        let extracted = extract(&map).unwrap();
        assert_eq!(extracted.value, "abc123");
        assert_eq!(extracted.source, TokenSource::Authorization);
    }

    #[test]
    fn authorization_without_bearer_prefix_is_ignored() {
        let map = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert!(extract(&map).is_none());
    }

    #[test]
    fn no_recognized_headers_yields_none() {
        assert!(extract(&HeaderMap::new()).is_none());
    }

    #[test]
    fn empty_header_values_are_treated_as_absent() {
        let map = headers(&[("x-hit-service-token", ""), ("authorization", "Bearer ")]);
        assert!(extract(&map).is_none());
    }
}
