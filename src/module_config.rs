// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 HIT Platform

//! Per-module configuration resolution and caching.
//!
//! Resolves "what is this module's effective configuration for this request"
//! by combining token extraction, local (unverified) claims decoding for
//! cache keys, and the provisioner's module-config endpoint. Configs are
//! cached per `(module, project, service)` triple with no TTL; entries
//! persist until [`ConfigCache::clear`] is called, typically after an
//! operator signals the remote config source changed.
//!
//! Concurrency: the cache is shared across requests. A cache-miss race can
//! cause a redundant remote fetch; the last writer wins. That is the chosen
//! tradeoff, the redundant fetch is harmless and a lock around the whole
//! fetch is not worth the serialization.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::auth::error::AuthError;
use crate::auth::token;
use crate::claims::decode_unverified;
use crate::client::ProvisionerClient;

/// Recognized top-level config sections.
const SETTINGS_KEY: &str = "settings";
const SECRETS_KEY: &str = "secrets";
const FEATURES_KEY: &str = "features";

/// Process-wide cache of fetched module configurations.
///
/// Entries are stored token-free and keyed by
/// `"{module}:{project}:{service}"`. Invalidation is whole-cache only.
#[derive(Debug, Default)]
pub struct ConfigCache {
    entries: RwLock<HashMap<String, Map<String, Value>>>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached config document.
    pub async fn get(&self, key: &str) -> Option<Map<String, Value>> {
        self.entries.read().await.get(key).cloned()
    }

    /// Store a config document. Only called after a fully successful
    /// response parse; a failed fetch never leaves a partial entry.
    pub async fn insert(&self, key: String, document: Map<String, Value>) {
        self.entries.write().await.insert(key, document);
    }

    /// Drop every cached entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// A module's effective configuration for one request.
///
/// The document itself is cached without any token; the request token and
/// the identity that keyed the lookup are attached fresh on every
/// resolution so downstream lookups always run under the live caller's
/// credentials, never a stale cached one.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleConfig {
    document: Map<String, Value>,
    request_token: String,
    project_slug: String,
    service_name: String,
}

impl ModuleConfig {
    /// The raw configuration document.
    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// A top-level config value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    fn section(&self, key: &str) -> Option<&Map<String, Value>> {
        self.document.get(key).and_then(Value::as_object)
    }

    /// The `settings` section, when present as a mapping.
    pub fn settings(&self) -> Option<&Map<String, Value>> {
        self.section(SETTINGS_KEY)
    }

    /// The `secrets` section, when present as a mapping.
    pub fn secrets(&self) -> Option<&Map<String, Value>> {
        self.section(SECRETS_KEY)
    }

    /// The `features` section, when present as a mapping.
    pub fn features(&self) -> Option<&Map<String, Value>> {
        self.section(FEATURES_KEY)
    }

    /// The live caller's token, for downstream provisioner lookups.
    pub fn request_token(&self) -> &str {
        &self.request_token
    }

    /// The project slug this config was resolved for.
    pub fn project_slug(&self) -> &str {
        &self.project_slug
    }

    /// The service name this config was resolved for.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

/// Identity picked from a request's token for cache keying.
struct RequestIdentity {
    token: String,
    project_slug: String,
    service_name: String,
}

/// Resolves module configuration for incoming requests.
pub struct ModuleConfigResolver {
    module_name: String,
    client: Arc<ProvisionerClient>,
    cache: ConfigCache,
}

impl ModuleConfigResolver {
    /// Create a resolver for `module_name`, using `cache` for fetched
    /// configs. Each test constructs its own cache; services share one per
    /// process.
    pub fn new(
        module_name: impl Into<String>,
        client: Arc<ProvisionerClient>,
        cache: ConfigCache,
    ) -> Self {
        Self {
            module_name: module_name.into(),
            client,
            cache,
        }
    }

    /// The module this resolver serves.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Empty the config cache. Call after the remote config source changed.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        tracing::info!(module = %self.module_name, "module config cache cleared");
    }

    /// Resolve the module's effective configuration for a request.
    ///
    /// The service token header is authoritative for identity: a service
    /// token that decodes but lacks `prj`/`svc` fails outright, with no
    /// fallback, because service tokens are required to carry both. Only
    /// when the service header is absent or its token does not decode at
    /// all does the `Authorization` token serve as a lower-trust fallback,
    /// and then only if it carries both claims itself.
    pub async fn resolve_for_request(
        &self,
        headers: &HeaderMap,
    ) -> Result<ModuleConfig, AuthError> {
        let identity = self.request_identity(headers)?;
        let key = cache_key(
            &self.module_name,
            &identity.project_slug,
            &identity.service_name,
        );

        if let Some(document) = self.cache.get(&key).await {
            tracing::debug!(key = %key, "module config cache hit");
            return Ok(self.augment(document, identity));
        }

        let document = self
            .client
            .get_module_config(&self.module_name, Some(&identity.token))
            .await?;

        // An empty document is valid: the module simply has no settings.
        self.cache.insert(key.clone(), document.clone()).await;
        tracing::info!(key = %key, "module config loaded from provisioner");
        Ok(self.augment(document, identity))
    }

    fn augment(&self, document: Map<String, Value>, identity: RequestIdentity) -> ModuleConfig {
        ModuleConfig {
            document,
            request_token: identity.token,
            project_slug: identity.project_slug,
            service_name: identity.service_name,
        }
    }

    fn request_identity(&self, headers: &HeaderMap) -> Result<RequestIdentity, AuthError> {
        let service_token = token::service_token(headers);
        let bearer_token = token::bearer_token(headers);

        if service_token.is_none() && bearer_token.is_none() {
            return Err(AuthError::ServiceTokenRequired);
        }

        if let Some(tok) = service_token {
            match decode_unverified(tok) {
                Some(claims) => {
                    let (Some(project), Some(service)) =
                        (claims.project_slug(), claims.service_name())
                    else {
                        tracing::warn!("service token missing prj/svc claims");
                        return Err(AuthError::InvalidServiceToken);
                    };
                    return Ok(RequestIdentity {
                        token: tok.to_string(),
                        project_slug: project.to_string(),
                        service_name: service.to_string(),
                    });
                }
                None => {
                    tracing::debug!("service token did not decode, trying Authorization fallback");
                }
            }
        }

        if let Some(tok) = bearer_token {
            if let Some(claims) = decode_unverified(tok) {
                if let (Some(project), Some(service)) =
                    (claims.project_slug(), claims.service_name())
                {
                    tracing::warn!(
                        project = project,
                        service = service,
                        "using Authorization token as lower-trust identity fallback"
                    );
                    return Ok(RequestIdentity {
                        token: tok.to_string(),
                        project_slug: project.to_string(),
                        service_name: service.to_string(),
                    });
                }
            }
        }

        Err(AuthError::NotAuthenticated)
    }
}

/// Cache key for a `(module, project, service)` triple.
fn cache_key(module: &str, project: &str, service: &str) -> String {
    format!("{module}:{project}:{service}")
}
