// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./flowbridge.toml` > `~/.config/flowbridge/flowbridge.toml`
//! > `/etc/flowbridge/flowbridge.toml` with environment variable overrides via the
//! `FLOWBRIDGE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::BridgeConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/flowbridge/flowbridge.toml` (system-wide)
/// 3. `~/.config/flowbridge/flowbridge.toml` (user XDG config)
/// 4. `./flowbridge.toml` (local directory)
/// 5. `FLOWBRIDGE_*` environment variables
pub fn load_config() -> Result<BridgeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<BridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BridgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BridgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(BridgeConfig::default()))
        .merge(Toml::file("/etc/flowbridge/flowbridge.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("flowbridge/flowbridge.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("flowbridge.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` and not `Env::split("_")`: `FLOWBRIDGE_GATEWAY_BEARER_TOKEN`
/// must map to `gateway.bearer_token`, not `gateway.bearer.token`.
/// Integrations are arrays and can only be set from TOML.
fn env_provider() -> Env {
    Env::prefixed("FLOWBRIDGE_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("agent_", "agent.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("gateway_", "gateway.", 1)
            .replacen("ticketing_", "ticketing.", 1);
        mapped.into()
    })
}
