// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 HIT Platform

//! Shared HIT routes mounted by every module.
//!
//! Public (no authentication, for probes and monitoring):
//! - `GET /healthz`, `GET /hit/healthz` - basic module status
//! - `GET /hit/version` - module version
//!
//! Authenticated (provisioner-verified bearer token):
//! - `GET /hit/config` - effective module config, secrets elided
//! - `GET /hit/provisioner` - provisioner connectivity status
//! - `POST /hit/reload` - clear the config cache and fetch fresh

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::auth::{Auth, AuthError};
use crate::state::HitState;
use crate::version::module_version;

/// Build the shared HIT router for a module.
pub fn hit_router(state: HitState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/hit/healthz", get(healthz))
        .route("/hit/version", get(version))
        .route("/hit/config", get(config))
        .route("/hit/provisioner", get(provisioner_status))
        .route("/hit/reload", post(reload))
        .with_state(state)
}

/// Health check. Deliberately does not touch the provisioner so probes
/// never fail on a provisioner outage.
async fn healthz(State(state): State<HitState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "module": state.module_name,
    }))
}

async fn version(State(state): State<HitState>) -> Json<Value> {
    Json(json!({
        "module": state.module_name,
        "version": module_version(),
    }))
}

/// Effective module config for the calling project/service. Secrets are
/// never exposed; only their presence is indicated.
async fn config(
    State(state): State<HitState>,
    Auth(claims): Auth,
    headers: HeaderMap,
) -> Result<Json<Value>, AuthError> {
    let config = state.resolver.resolve_for_request(&headers).await?;

    let authenticated_as = match (claims.project_slug(), claims.service_name()) {
        (Some(project), Some(service)) => Some(format!("{project}/{service}")),
        (Some(project), None) => Some(project.to_string()),
        _ => None,
    };

    Ok(Json(json!({
        "module": state.module_name,
        "config_source": "provisioner",
        "settings": config.settings().cloned().unwrap_or_default(),
        "has_secrets": config.secrets().map(|s| !s.is_empty()).unwrap_or(false),
        "authenticated_as": authenticated_as,
    })))
}

async fn provisioner_status(
    State(state): State<HitState>,
    Auth(claims): Auth,
) -> Json<Value> {
    let healthy = state.client.ping().await;
    Json(json!({
        "module": state.module_name,
        "provisioner_configured": true,
        "provisioner_healthy": healthy,
        "authenticated": true,
        "project_slug": claims.project_slug(),
        "service_name": claims.service_name(),
    }))
}

async fn reload(
    State(state): State<HitState>,
    Auth(_claims): Auth,
    headers: HeaderMap,
) -> Result<Json<Value>, AuthError> {
    state.resolver.clear_cache().await;
    let config = state.resolver.resolve_for_request(&headers).await?;
    Ok(Json(json!({
        "status": "ok",
        "module": state.module_name,
        "message": "Configuration reloaded",
        "settings": config.settings().cloned().unwrap_or_default(),
    })))
}
