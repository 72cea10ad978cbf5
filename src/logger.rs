// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 HIT Platform

//! Centralized logging bootstrap for HIT modules.
//!
//! Installs a global tracing subscriber with a consistent format across
//! modules. Level comes from `RUST_LOG` when set, else
//! `HIT_MODULES_LOG_LEVEL`, else `info`. `LOG_FORMAT=json` switches to
//! structured output for log aggregation.

use std::env;

use tracing_subscriber::EnvFilter;

/// Environment variable selecting the default log level.
pub const LOG_LEVEL_ENV: &str = "HIT_MODULES_LOG_LEVEL";

/// Environment variable selecting the log format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Install the global tracing subscriber.
///
/// Idempotent: calling again after a subscriber is installed is a no-op.
pub fn init_logging() {
    let default_level = env::var(LOG_LEVEL_ENV)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_lowercase()));

    let json = env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    // A second init attempt means a subscriber already exists; keep it.
    if result.is_err() {
        tracing::debug!("logging already initialized, keeping existing subscriber");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_logging();
        init_logging();
    }
}
