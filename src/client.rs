// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 HIT Platform

//! HTTP client for the provisioning service.
//!
//! Thin wrapper around the provisioner API. All calls carry a bounded
//! timeout (from [`ClientConfig`], default 5 seconds) after which they fail
//! with a transport error rather than hanging the enclosing request. No
//! automatic retry is performed; callers decide their own retry policy, and
//! only transport failures are ever retry-safe.

use reqwest::{header, Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ProvisionerError;

const USER_AGENT: &str = concat!("hit-modules-client/", env!("CARGO_PKG_VERSION"));

/// The provisioner's authoritative answer to "is this token valid, and is
/// module/method access permitted".
///
/// `valid` and the ACL fields are optional on the wire: plain token
/// validation responses carry only `claims`, and a missing `valid` on an ACL
/// response is a malformed reply the caller must treat as a provisioner
/// failure, not a rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationResult {
    /// Token validity flag (ACL responses only).
    #[serde(default)]
    pub valid: Option<bool>,
    /// Authoritative claims, distinct from any locally-decoded ones.
    #[serde(default)]
    pub claims: Option<Map<String, Value>>,
    /// Whether module-level access is allowed.
    #[serde(default)]
    pub module_allowed: Option<bool>,
    /// Whether method-level access is allowed (when a method was checked).
    #[serde(default)]
    pub method_allowed: Option<bool>,
    /// Explanation supplied by the provisioner when access is denied.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Client for the provisioner HTTP API.
#[derive(Debug, Clone)]
pub struct ProvisionerClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl ProvisionerClient {
    /// Create a client from an explicit configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ProvisionerError> {
        if config.base_url.trim().is_empty() {
            return Err(ProvisionerError::Config(
                "Provisioner base URL is not configured. Set PROVISIONER_URL or supply a ClientConfig.".to_string(),
            ));
        }
        Url::parse(&config.base_url).map_err(|e| {
            ProvisionerError::Config(format!(
                "Provisioner base URL '{}' is invalid: {e}",
                config.base_url
            ))
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| ProvisionerError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { config, http })
    }

    /// Create a client from environment variables.
    ///
    /// `require_token` should be off for shared modules that only validate
    /// incoming tokens.
    pub fn from_env(require_token: bool) -> Result<Self, ProvisionerError> {
        Self::new(ClientConfig::from_env(require_token)?)
    }

    /// The configured base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    /// Perform a request and map the response per the provisioner's
    /// conventions: 200 with an empty body is an empty document, 401 is an
    /// authentication failure, 404 is a missing secret, anything else is a
    /// request error carrying the status.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> Result<Map<String, Value>, ProvisionerError> {
        let url = self.build_url(path);
        tracing::debug!(method = %method, url = %url, "provisioner request");

        let mut request = self
            .http
            .request(method, &url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = bearer.or_else(|| self.config.outbound_token()) {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "provisioner request failed");
            ProvisionerError::request(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::OK {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ProvisionerError::request(e.to_string()))?;
            if bytes.is_empty() {
                return Ok(Map::new());
            }
            return match serde_json::from_slice::<Value>(&bytes) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(other) => Err(ProvisionerError::request(format!(
                    "Unexpected JSON response from provisioner: {other}"
                ))),
                Err(e) => Err(ProvisionerError::request(format!(
                    "Invalid JSON response from provisioner: {e}"
                ))),
            };
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(ProvisionerError::Auth),
            StatusCode::NOT_FOUND => Err(ProvisionerError::SecretNotFound),
            _ => {
                let detail = response.text().await.unwrap_or_default();
                let detail = if detail.is_empty() {
                    "Unknown error".to_string()
                } else {
                    detail
                };
                Err(ProvisionerError::request_with_status(detail, status.as_u16()))
            }
        }
    }

    /// Ask the provisioner to validate an end-user/project token.
    pub async fn verify_token(&self, token: &str) -> Result<VerificationResult, ProvisionerError> {
        let body = self
            .request(
                Method::POST,
                "/api/v1/tokens/validate",
                Some(json!({ "token": token })),
                None,
            )
            .await?;
        parse_verification(body)
    }

    /// Validate a token and check module/method access in one call.
    ///
    /// When `method_name` is absent only module-level access is checked.
    pub async fn verify_token_with_acl(
        &self,
        token: &str,
        module_name: &str,
        method_name: Option<&str>,
    ) -> Result<VerificationResult, ProvisionerError> {
        let mut payload = json!({
            "token": token,
            "moduleName": module_name,
        });
        if let Some(method) = method_name {
            payload["methodName"] = Value::String(method.to_string());
        }

        let body = self
            .request(Method::POST, "/api/v1/tokens/validate", Some(payload), None)
            .await?;
        parse_verification(body)
    }

    /// Fetch module-specific configuration.
    ///
    /// `bearer` overrides the configured token; the config resolver passes
    /// the caller's request token here so lookups run under the live
    /// caller's credentials.
    pub async fn get_module_config(
        &self,
        module_name: &str,
        bearer: Option<&str>,
    ) -> Result<Map<String, Value>, ProvisionerError> {
        self.request(
            Method::POST,
            "/api/v1/config/module",
            Some(json!({ "moduleName": module_name })),
            bearer,
        )
        .await
    }

    /// Fetch a database secret (connection string + metadata).
    pub async fn get_database_secret(
        &self,
        namespace: &str,
        secret_key: &str,
        role: Option<&str>,
        bearer: Option<&str>,
    ) -> Result<Map<String, Value>, ProvisionerError> {
        self.request(
            Method::POST,
            "/api/v1/secrets/database",
            Some(json!({
                "namespace": namespace,
                "secretKey": secret_key,
                "role": role,
            })),
            bearer,
        )
        .await
    }

    /// Check provisioner health.
    pub async fn ping(&self) -> bool {
        match self.request(Method::GET, "/healthz", None, None).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "provisioner health check failed");
                false
            }
        }
    }
}

fn parse_verification(body: Map<String, Value>) -> Result<VerificationResult, ProvisionerError> {
    serde_json::from_value(Value::Object(body)).map_err(|e| {
        ProvisionerError::request(format!("Malformed verification response: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{spawn_app, stub_client, unreachable_client};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn rejects_empty_base_url() {
        let result = ProvisionerClient::new(ClientConfig::new(""));
        assert!(matches!(result, Err(ProvisionerError::Config(_))));
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let result = ProvisionerClient::new(ClientConfig::new("not a url"));
        assert!(matches!(result, Err(ProvisionerError::Config(_))));
    }

    #[tokio::test]
    async fn verify_token_parses_claims() {
        let app = Router::new().route(
            "/api/v1/tokens/validate",
            post(|| async {
                Json(json!({
                    "valid": true,
                    "claims": {"prj": "acme", "svc": "billing"},
                }))
            }),
        );
        let client = stub_client(spawn_app(app).await);

        let result = client.verify_token("tok").await.unwrap();
        assert_eq!(result.valid, Some(true));
        let claims = result.claims.unwrap();
        assert_eq!(claims["prj"], "acme");
        assert_eq!(claims["svc"], "billing");
    }

    #[tokio::test]
    async fn acl_request_includes_method_name() {
        let app = Router::new().route(
            "/api/v1/tokens/validate",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["moduleName"], "ping-pong");
                assert_eq!(body["methodName"], "increment");
                Json(json!({"valid": true, "claims": {}, "module_allowed": true, "method_allowed": true}))
            }),
        );
        let client = stub_client(spawn_app(app).await);

        let result = client
            .verify_token_with_acl("tok", "ping-pong", Some("increment"))
            .await
            .unwrap();
        assert_eq!(result.module_allowed, Some(true));
    }

    #[tokio::test]
    async fn maps_401_to_auth_error() {
        let app = Router::new().route(
            "/api/v1/tokens/validate",
            post(|| async { StatusCode::UNAUTHORIZED }),
        );
        let client = stub_client(spawn_app(app).await);

        let err = client.verify_token("bad").await.unwrap_err();
        assert!(matches!(err, ProvisionerError::Auth));
    }

    #[tokio::test]
    async fn maps_404_to_secret_not_found() {
        let app = Router::new().route(
            "/api/v1/secrets/database",
            post(|| async { StatusCode::NOT_FOUND }),
        );
        let client = stub_client(spawn_app(app).await);

        let err = client
            .get_database_secret("shared", "auth-db", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionerError::SecretNotFound));
    }

    #[tokio::test]
    async fn maps_server_errors_to_request_error_with_status() {
        let app = Router::new().route(
            "/api/v1/config/module",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let client = stub_client(spawn_app(app).await);

        let err = client.get_module_config("ping-pong", None).await.unwrap_err();
        match err {
            ProvisionerError::Request { status, message } => {
                assert_eq!(status, Some(500));
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        let client = unreachable_client().await;
        let err = client.verify_token("tok").await.unwrap_err();
        assert!(err.is_transport(), "expected transport error, got {err:?}");
    }

    #[tokio::test]
    async fn empty_200_body_is_an_empty_document() {
        let app = Router::new().route("/api/v1/config/module", post(|| async { "" }));
        let client = stub_client(spawn_app(app).await);

        let config = client.get_module_config("ping-pong", None).await.unwrap();
        assert!(config.is_empty());
    }

    #[tokio::test]
    async fn bearer_override_replaces_configured_token() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_handler = seen.clone();
        let app = Router::new().route(
            "/api/v1/config/module",
            post(
                move |headers: axum::http::HeaderMap, Json(_): Json<Value>| async move {
                    let auth = headers
                        .get(axum::http::header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default();
                    assert_eq!(auth, "Bearer request-token");
                    seen_in_handler.fetch_add(1, Ordering::SeqCst);
                    Json(json!({}))
                },
            ),
        );
        let base_url = spawn_app(app).await;
        let client = ProvisionerClient::new(
            ClientConfig::new(base_url).with_module_token("configured-token"),
        )
        .unwrap();

        client
            .get_module_config("ping-pong", Some("request-token"))
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ping_reports_health() {
        let app = Router::new().route("/healthz", get(|| async { "" }));
        let client = stub_client(spawn_app(app).await);
        assert!(client.ping().await);

        let client = unreachable_client().await;
        assert!(!client.ping().await);
    }
}
