// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 HIT Platform

//! Request authentication gate.
//!
//! Produces [`VerifiedClaims`] for a request or rejects it. Validation is
//! always delegated to the provisioner; the gate never trusts locally
//! decoded claims. Available as the [`Auth`] extractor for handlers and as
//! [`auth_middleware`] for whole router subtrees.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::error::AuthError;
use super::token;
use crate::claims::VerifiedClaims;
use crate::client::{ProvisionerClient, VerificationResult};
use crate::state::HitState;

/// Authenticate a request against the provisioner.
///
/// Fails with `MissingToken` when no token is present, `VerifierUnavailable`
/// when the provisioner cannot be reached, and `InvalidToken` when the
/// provisioner rejects the token or returns no claims for it.
pub async fn require_token(
    headers: &HeaderMap,
    client: &ProvisionerClient,
) -> Result<VerifiedClaims, AuthError> {
    let extracted = token::extract(headers).ok_or(AuthError::MissingToken)?;

    let result = client.verify_token(extracted.value).await?;
    match result.claims {
        Some(claims) if !claims.is_empty() => Ok(VerifiedClaims::new(claims)),
        _ => {
            tracing::debug!("token verification result missing claims");
            Err(AuthError::InvalidToken)
        }
    }
}

/// Authenticate a request and enforce module/method ACL.
///
/// When `method_name` is `None` it is derived from the last non-empty
/// segment of the request path. That derivation is a convention, not a
/// binding: route aliasing can misclassify an action, so security-sensitive
/// endpoints should pass an explicit method name.
pub async fn require_method_acl(
    headers: &HeaderMap,
    path: &str,
    client: &ProvisionerClient,
    module_name: &str,
    method_name: Option<&str>,
) -> Result<VerifiedClaims, AuthError> {
    let extracted = token::extract(headers).ok_or(AuthError::MissingToken)?;
    let method = method_name.or_else(|| method_name_from_path(path));

    let result = client
        .verify_token_with_acl(extracted.value, module_name, method)
        .await?;
    evaluate_acl(result, module_name, method)
}

/// Derive a method name from the last non-empty path segment.
///
/// `/hit/increment` and `/hit/increment/` both yield `increment`.
pub fn method_name_from_path(path: &str) -> Option<&str> {
    path.trim_end_matches('/')
        .rsplit('/')
        .find(|segment| !segment.is_empty())
}

/// Evaluate an ACL verification result.
///
/// Pure decision logic, split out from the network call: a result missing
/// the `valid` flag is a provisioner fault (503), `valid == false` is a
/// rejected token (401), and ACL denials are 403 carrying the provisioner's
/// reason verbatim. Module denial takes precedence over method denial.
pub fn evaluate_acl(
    result: VerificationResult,
    module_name: &str,
    method_name: Option<&str>,
) -> Result<VerifiedClaims, AuthError> {
    let valid = result.valid.ok_or(AuthError::VerifierMisbehaved)?;
    if !valid {
        tracing::debug!(module = module_name, "token ACL verification failed");
        return Err(AuthError::InvalidToken);
    }

    // Absent ACL flags mean allowed-by-default; only an explicit denial blocks.
    if result.module_allowed == Some(false) {
        let reason = result
            .reason
            .unwrap_or_else(|| format!("Access to module '{module_name}' denied"));
        tracing::warn!(module = module_name, reason = %reason, "module ACL denied");
        return Err(AuthError::ModuleForbidden(reason));
    }

    if let Some(method) = method_name {
        if result.method_allowed == Some(false) {
            let reason = result.reason.unwrap_or_else(|| {
                format!("Access to method '{method}' on module '{module_name}' denied")
            });
            tracing::warn!(module = module_name, method = method, reason = %reason, "method ACL denied");
            return Err(AuthError::MethodForbidden(reason));
        }
    }

    Ok(VerifiedClaims::new(result.claims.unwrap_or_default()))
}

/// Extractor for provisioner-authenticated requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn my_handler(Auth(claims): Auth) -> impl IntoResponse {
///     // claims are authoritative, from the provisioner
/// }
/// ```
pub struct Auth(pub VerifiedClaims);

impl FromRequestParts<HitState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HitState,
    ) -> Result<Self, Self::Rejection> {
        // Middleware may have authenticated the request already.
        if let Some(claims) = parts.extensions.get::<VerifiedClaims>().cloned() {
            return Ok(Auth(claims));
        }

        let claims = require_token(&parts.headers, &state.client).await?;
        Ok(Auth(claims))
    }
}

/// Authentication middleware.
///
/// Verifies the request token and stores the resulting [`VerifiedClaims`]
/// in request extensions for downstream extractors.
pub async fn auth_middleware(
    State(state): State<HitState>,
    mut request: Request,
    next: Next,
) -> Response {
    match require_token(request.headers(), &state.client).await {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Method-level ACL middleware.
///
/// Uses the state's module name and the request path's last segment as the
/// method name.
pub async fn method_acl_middleware(
    State(state): State<HitState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let result = require_method_acl(
        request.headers(),
        &path,
        &state.client,
        &state.module_name,
        None,
    )
    .await;

    match result {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{spawn_app, stub_client, unreachable_client};
    use axum::http::{HeaderValue, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Map, Value};

    fn auth_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    fn acl_result(body: Value) -> VerificationResult {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn method_name_comes_from_last_segment() {
        assert_eq!(method_name_from_path("/hit/increment"), Some("increment"));
        assert_eq!(method_name_from_path("/hit/increment/"), Some("increment"));
        assert_eq!(method_name_from_path("/increment"), Some("increment"));
        assert_eq!(method_name_from_path("/"), None);
        assert_eq!(method_name_from_path(""), None);
    }

    #[test]
    fn module_denial_wins_regardless_of_method_flag() {
        let result = acl_result(json!({
            "valid": true,
            "module_allowed": false,
            "method_allowed": true,
            "reason": "not permitted",
        }));
        let err = evaluate_acl(result, "ping-pong", Some("increment")).unwrap_err();
        match err {
            AuthError::ModuleForbidden(reason) => assert_eq!(reason, "not permitted"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn method_denial_carries_reason() {
        let result = acl_result(json!({
            "valid": true,
            "module_allowed": true,
            "method_allowed": false,
            "reason": "increment not in uses list",
        }));
        let err = evaluate_acl(result, "ping-pong", Some("increment")).unwrap_err();
        match err {
            AuthError::MethodForbidden(reason) => {
                assert_eq!(reason, "increment not in uses list")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn method_flag_ignored_when_no_method_was_checked() {
        let result = acl_result(json!({
            "valid": true,
            "module_allowed": true,
            "method_allowed": false,
        }));
        assert!(evaluate_acl(result, "ping-pong", None).is_ok());
    }

    #[test]
    fn missing_valid_flag_is_a_provisioner_fault() {
        let result = acl_result(json!({ "claims": {} }));
        let err = evaluate_acl(result, "ping-pong", None).unwrap_err();
        assert!(matches!(err, AuthError::VerifierMisbehaved));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn invalid_token_is_rejected() {
        let result = acl_result(json!({ "valid": false }));
        let err = evaluate_acl(result, "ping-pong", None).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn absent_acl_flags_default_to_allowed() {
        let mut claims = Map::new();
        claims.insert("prj".to_string(), Value::String("acme".to_string()));
        let result = acl_result(json!({ "valid": true, "claims": {"prj": "acme"} }));
        let verified = evaluate_acl(result, "ping-pong", Some("increment")).unwrap();
        assert_eq!(verified.project_slug(), Some("acme"));
        assert_eq!(verified.as_map(), &claims);
    }

    #[tokio::test]
    async fn require_token_without_headers_is_missing_token() {
        let client = unreachable_client().await;
        let err = require_token(&HeaderMap::new(), &client).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingToken));
    }

    #[tokio::test]
    async fn require_token_returns_authoritative_claims() {
        let app = Router::new().route(
            "/api/v1/tokens/validate",
            post(|| async { Json(json!({"claims": {"prj": "acme", "svc": "billing"}})) }),
        );
        let client = stub_client(spawn_app(app).await);

        let claims = require_token(&auth_headers("tok"), &client).await.unwrap();
        assert_eq!(claims.project_slug(), Some("acme"));
        assert_eq!(claims.service_name(), Some("billing"));
    }

    #[tokio::test]
    async fn require_token_rejects_response_without_claims() {
        let app = Router::new().route(
            "/api/v1/tokens/validate",
            post(|| async { Json(json!({"valid": true})) }),
        );
        let client = stub_client(spawn_app(app).await);

        let err = require_token(&auth_headers("tok"), &client)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn require_token_maps_unreachable_verifier_to_503() {
        let client = unreachable_client().await;
        let err = require_token(&auth_headers("tok"), &client)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::VerifierUnavailable(_)));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn require_method_acl_derives_method_from_path() {
        let app = Router::new().route(
            "/api/v1/tokens/validate",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["methodName"], "increment");
                Json(json!({"valid": true, "claims": {}, "module_allowed": true, "method_allowed": true}))
            }),
        );
        let client = stub_client(spawn_app(app).await);

        require_method_acl(
            &auth_headers("tok"),
            "/hit/increment",
            &client,
            "ping-pong",
            None,
        )
        .await
        .unwrap();
    }
}
