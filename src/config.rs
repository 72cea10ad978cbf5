// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 HIT Platform

//! # Provisioner Client Configuration
//!
//! This module defines environment variable names and the typed configuration
//! container for the provisioner client. Configuration is loaded from the
//! environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `PROVISIONER_URL` | Base URL of the provisioning service | Required |
//! | `HIT_MODULE_ID_TOKEN` | Module identity token for outbound calls | Required unless `require_token` is off |
//! | `HIT_PROJECT_TOKEN` | Legacy project token (fallback credential) | Optional |
//! | `HIT_PROVISIONER_TIMEOUT` | Request timeout in seconds | `5` |
//! | `HIT_PROVISIONER_VERIFY_SSL` | TLS certificate verification toggle | `true` |
//! | `HIT_MODULE_NAME` | Name of the local module (cache keys, ACL) | Required for config resolution |
//! | `HIT_MODULE_VERSION` | Version override reported by `/hit/version` | Crate version |
//! | `HIT_MODULES_LOG_LEVEL` | Log level filter for the logger bootstrap | `info` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |

use std::env;
use std::time::Duration;

use crate::error::ProvisionerError;

/// Environment variable holding the provisioner base URL.
pub const PROVISIONER_URL_ENV: &str = "PROVISIONER_URL";

/// Environment variable holding the module identity token.
pub const MODULE_TOKEN_ENV: &str = "HIT_MODULE_ID_TOKEN";

/// Environment variable holding the legacy project token.
pub const PROJECT_TOKEN_ENV: &str = "HIT_PROJECT_TOKEN";

/// Environment variable overriding the outbound request timeout (seconds).
pub const TIMEOUT_ENV: &str = "HIT_PROVISIONER_TIMEOUT";

/// Environment variable toggling TLS certificate verification.
pub const VERIFY_SSL_ENV: &str = "HIT_PROVISIONER_VERIFY_SSL";

/// Environment variable naming the local module.
pub const MODULE_NAME_ENV: &str = "HIT_MODULE_NAME";

/// Default outbound request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

fn read_bool(value: Option<String>, default: bool) -> bool {
    match value {
        Some(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

fn read_timeout(value: Option<String>, default: Duration) -> Duration {
    match value.and_then(|v| v.parse::<f64>().ok()) {
        Some(secs) if secs > 0.0 => Duration::from_secs_f64(secs),
        _ => default,
    }
}

/// Typed container for provisioner client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the provisioning service.
    pub base_url: String,
    /// Module identity token, sent as a bearer header on outbound calls.
    pub module_token: Option<String>,
    /// Legacy project token, used when no module token is configured.
    pub project_token: Option<String>,
    /// Outbound request timeout.
    pub timeout: Duration,
    /// TLS certificate verification toggle.
    pub verify_ssl: bool,
}

impl ClientConfig {
    /// Build a config with just a base URL and defaults for everything else.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            module_token: None,
            project_token: None,
            timeout: DEFAULT_TIMEOUT,
            verify_ssl: true,
        }
    }

    /// Attach a module token for outbound authentication.
    pub fn with_module_token(mut self, token: impl Into<String>) -> Self {
        self.module_token = Some(token.into());
        self
    }

    /// Override the outbound request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build config from environment variables.
    ///
    /// `require_token` should be off for shared modules that only validate
    /// incoming tokens and never authenticate as themselves.
    pub fn from_env(require_token: bool) -> Result<Self, ProvisionerError> {
        let base_url = env::var(PROVISIONER_URL_ENV)
            .unwrap_or_default()
            .trim()
            .to_string();
        if base_url.is_empty() {
            return Err(ProvisionerError::Config(format!(
                "Provisioner base URL missing. Did you forget to set {PROVISIONER_URL_ENV}?"
            )));
        }

        let module_token = env::var(MODULE_TOKEN_ENV).ok().filter(|t| !t.is_empty());
        let project_token = env::var(PROJECT_TOKEN_ENV).ok().filter(|t| !t.is_empty());
        if require_token && module_token.is_none() && project_token.is_none() {
            return Err(ProvisionerError::Config(format!(
                "Provisioner authentication requires {MODULE_TOKEN_ENV}."
            )));
        }

        Ok(Self {
            base_url,
            module_token,
            project_token,
            timeout: read_timeout(env::var(TIMEOUT_ENV).ok(), DEFAULT_TIMEOUT),
            verify_ssl: read_bool(env::var(VERIFY_SSL_ENV).ok(), true),
        })
    }

    /// The token used for outbound calls, module token preferred.
    pub fn outbound_token(&self) -> Option<&str> {
        self.module_token
            .as_deref()
            .or(self.project_token.as_deref())
    }
}

/// Read the local module name from the environment.
pub fn module_name_from_env() -> Option<String> {
    env::var(MODULE_NAME_ENV).ok().filter(|n| !n.is_empty())
}
