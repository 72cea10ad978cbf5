// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 HIT Platform

//! HIT Modules - Shared Authentication and Configuration Library
//!
//! This crate provides the shared request-scoped pipeline every HIT module
//! embeds: token extraction, remote verification against the provisioner,
//! per-identity module configuration with caching, and database connection
//! management backed by provisioner-held secrets.
//!
//! ## Modules
//!
//! - `auth` - Token extraction, verification gates, and axum extractors
//! - `claims` - Unverified and verified token claims
//! - `client` - HTTP client for the provisioner API
//! - `module_config` - Per-request config resolution and caching
//! - `database` - Database URL lookup and pooled engines (sqlx)
//! - `routes` - The shared `/hit/*` axum surface
//! - `state` - Shared state wiring for module servers

pub mod auth;
pub mod claims;
pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod logger;
pub mod module_config;
pub mod routes;
pub mod state;
pub mod version;

#[cfg(test)]
mod testutil;

pub use auth::{Auth, AuthError};
pub use claims::{decode_unverified, UnverifiedClaims, VerifiedClaims};
pub use client::{ProvisionerClient, VerificationResult};
pub use config::ClientConfig;
pub use database::{DatabaseConnectionManager, Engine};
pub use error::{DatabaseError, ProvisionerError};
pub use logger::init_logging;
pub use module_config::{ConfigCache, ModuleConfig, ModuleConfigResolver};
pub use routes::hit_router;
pub use state::HitState;
pub use version::{log_module_startup, module_version};
