// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 HIT Platform

//! Authentication and authorization errors.
//!
//! Status mapping policy: transport/configuration failures reaching the
//! provisioner are 503 (the service cannot authorize anyone right now),
//! authentication failures are 401, authorization (ACL) denials are 403
//! and carry the provisioner's reason verbatim.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::ProvisionerError;

/// Request-scoped authentication error.
#[derive(Debug)]
pub enum AuthError {
    /// No token in either recognized header.
    MissingToken,
    /// The provisioner rejected the token, or returned no claims for it.
    InvalidToken,
    /// A service token decoded but lacks the required `prj`/`svc` claims.
    InvalidServiceToken,
    /// Config resolution found no token at all.
    ServiceTokenRequired,
    /// No usable token after the fallback path was exhausted.
    NotAuthenticated,
    /// Module-level ACL denied access.
    ModuleForbidden(String),
    /// Method-level ACL denied access.
    MethodForbidden(String),
    /// The provisioner could not be reached or answered unusably.
    VerifierUnavailable(String),
    /// The provisioner client is locally misconfigured.
    VerifierMisconfigured(String),
    /// The provisioner answered with a response missing required fields.
    VerifierMisbehaved,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::InvalidServiceToken => "invalid_service_token",
            AuthError::ServiceTokenRequired => "service_token_required",
            AuthError::NotAuthenticated => "not_authenticated",
            AuthError::ModuleForbidden(_) => "module_forbidden",
            AuthError::MethodForbidden(_) => "method_forbidden",
            AuthError::VerifierUnavailable(_) => "verifier_unavailable",
            AuthError::VerifierMisconfigured(_) => "verifier_misconfigured",
            AuthError::VerifierMisbehaved => "verifier_misbehaved",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidServiceToken
            | AuthError::ServiceTokenRequired
            | AuthError::NotAuthenticated
            | AuthError::ModuleForbidden(_)
            | AuthError::MethodForbidden(_) => StatusCode::FORBIDDEN,
            AuthError::VerifierUnavailable(_)
            | AuthError::VerifierMisconfigured(_)
            | AuthError::VerifierMisbehaved => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Map a provisioner client error onto the request-facing taxonomy.
    pub fn from_provisioner(err: ProvisionerError) -> Self {
        match err {
            ProvisionerError::Config(msg) => AuthError::VerifierMisconfigured(msg),
            ProvisionerError::Auth => AuthError::InvalidToken,
            ProvisionerError::Request { message, .. } => AuthError::VerifierUnavailable(message),
            // A 404 never comes back from token validation or config
            // endpoints in normal operation; treat it as a misbehaving
            // provisioner rather than a rejected caller.
            ProvisionerError::SecretNotFound => {
                AuthError::VerifierUnavailable("Provisioner returned 404".to_string())
            }
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Missing bearer token"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::InvalidServiceToken => {
                write!(f, "Service token is missing required prj/svc claims")
            }
            AuthError::ServiceTokenRequired => write!(f, "Service token required"),
            AuthError::NotAuthenticated => write!(f, "Not authenticated"),
            AuthError::ModuleForbidden(reason) => write!(f, "{reason}"),
            AuthError::MethodForbidden(reason) => write!(f, "{reason}"),
            AuthError::VerifierUnavailable(msg) => write!(f, "Provisioner unreachable: {msg}"),
            AuthError::VerifierMisconfigured(msg) => write!(f, "Provisioner misconfigured: {msg}"),
            AuthError::VerifierMisbehaved => {
                write!(f, "Provisioner returned invalid response format")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl From<ProvisionerError> for AuthError {
    fn from(err: ProvisionerError) -> Self {
        Self::from_provisioner(err)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
