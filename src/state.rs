// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 HIT Platform

use std::sync::Arc;

use crate::client::ProvisionerClient;
use crate::config::{module_name_from_env, ClientConfig};
use crate::error::ProvisionerError;
use crate::module_config::{ConfigCache, ModuleConfigResolver};

/// Shared state for the HIT axum surface: the provisioner client and the
/// module's config resolver.
#[derive(Clone)]
pub struct HitState {
    pub module_name: String,
    pub client: Arc<ProvisionerClient>,
    pub resolver: Arc<ModuleConfigResolver>,
}

impl HitState {
    pub fn new(module_name: impl Into<String>, client: Arc<ProvisionerClient>) -> Self {
        let module_name = module_name.into();
        let resolver = Arc::new(ModuleConfigResolver::new(
            module_name.clone(),
            client.clone(),
            ConfigCache::new(),
        ));
        Self {
            module_name,
            client,
            resolver,
        }
    }

    /// Build state from the environment. Shared modules validate incoming
    /// tokens rather than authenticating as themselves, so no outbound
    /// token is required.
    pub fn from_env() -> Result<Self, ProvisionerError> {
        let module_name = module_name_from_env().ok_or_else(|| {
            ProvisionerError::Config(
                "HIT_MODULE_NAME environment variable is required. Set it to the module name (e.g., 'ping-pong').".to_string(),
            )
        })?;
        let client = Arc::new(ProvisionerClient::new(ClientConfig::from_env(false)?)?);
        Ok(Self::new(module_name, client))
    }
}
