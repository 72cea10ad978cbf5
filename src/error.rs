// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 HIT Platform

//! Library-level errors for provisioner interactions and database resolution.
//!
//! The HTTP-facing authentication errors live in [`crate::auth::AuthError`];
//! these types are what the client and database layers return to callers,
//! which the auth layer then maps onto response statuses.

use thiserror::Error;

/// Errors from provisioner interactions.
///
/// The distinction between [`ProvisionerError::Request`] (remote unreachable
/// or misbehaving) and [`ProvisionerError::Auth`] (token rejected) matters:
/// they surface as different HTTP statuses (503 vs 401) and only the former
/// is ever worth retrying.
#[derive(Debug, Error)]
pub enum ProvisionerError {
    /// Local configuration is invalid (missing/bad base URL, missing token).
    #[error("Provisioner misconfigured: {0}")]
    Config(String),

    /// Transport failure or unexpected response from the provisioner.
    #[error("Provisioner request failed: {message}")]
    Request {
        message: String,
        /// HTTP status, when the remote answered at all.
        status: Option<u16>,
    },

    /// The provisioner rejected our credentials (HTTP 401).
    #[error("Provisioner authentication failed")]
    Auth,

    /// The requested secret does not exist (HTTP 404).
    #[error("Requested secret not found")]
    SecretNotFound,
}

impl ProvisionerError {
    pub(crate) fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
            status: None,
        }
    }

    pub(crate) fn request_with_status(message: impl Into<String>, status: u16) -> Self {
        Self::Request {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Whether this error means the provisioner could not be reached or
    /// answered unusably, as opposed to rejecting the request outright.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Request { .. })
    }
}

/// Errors from database URL and engine resolution.
///
/// Each variant identifies which step of the resolution failed so operators
/// can tell a missing secret from a provisioner outage.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The database manager itself is misconfigured.
    #[error("Database connection misconfigured: {0}")]
    Misconfigured(String),

    /// The provisioner lookup for the secret failed.
    #[error("Provisioner lookup failed for namespace '{namespace}': {source}")]
    Lookup {
        namespace: String,
        #[source]
        source: ProvisionerError,
    },

    /// The provisioner answered but returned no secret payload.
    #[error(
        "Provisioner returned empty secret for namespace '{namespace}' ({secret_key}). \
         Check that the database has been provisioned and the secret store regenerated."
    )]
    EmptySecret {
        namespace: String,
        secret_key: String,
    },

    /// The secret payload lacks a connection URL field.
    #[error("Provisioner secret missing database URL for namespace '{namespace}' ({secret_key})")]
    MissingUrl {
        namespace: String,
        secret_key: String,
    },

    /// No database role matched the service selection rules.
    #[error(
        "No primary database mapping found for service='{service_name}' env_key='{env_key}'. \
         Ensure database roles include primary: true, the service name, and env: {env_key}."
    )]
    NoPrimaryRole {
        service_name: String,
        env_key: String,
    },

    /// The resolved URL could not be turned into an engine.
    #[error("Failed to construct database engine: {0}")]
    Engine(#[source] sqlx::Error),
}
