// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 HIT Platform

//! Version detection and startup logging for HIT modules.

use std::env;

/// Environment variable overriding the reported module version. Modules are
/// statically compiled, so deployments that want the binary's own version
/// surfaced set this at build or deploy time.
pub const MODULE_VERSION_ENV: &str = "HIT_MODULE_VERSION";

const UNKNOWN_VERSION: &str = "0.0.0";

/// The module version to report: the `HIT_MODULE_VERSION` override when
/// set, otherwise `0.0.0`.
pub fn module_version() -> String {
    match env::var(MODULE_VERSION_ENV) {
        Ok(v) if !v.is_empty() => v,
        _ => {
            tracing::debug!("could not determine module version, using default '{UNKNOWN_VERSION}'");
            UNKNOWN_VERSION.to_string()
        }
    }
}

/// Log the standardized module startup message.
pub fn log_module_startup(module_name: &str, version: Option<&str>) {
    let version = version.map(str::to_string).unwrap_or_else(module_version);
    let service_name = display_name(module_name);
    tracing::info!("Starting Hit {service_name} Service v{version}");
}

/// Turn a module slug into a display name: `ping-pong` becomes `Ping Pong`.
fn display_name(module_name: &str) -> String {
    module_name
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
