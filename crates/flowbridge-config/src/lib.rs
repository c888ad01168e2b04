// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the FlowBridge session bridge.
//!
//! Reads `flowbridge.toml` from the XDG hierarchy, applies `FLOWBRIDGE_*`
//! environment overrides, rejects unknown keys, and renders failures as
//! miette diagnostics with typo suggestions.
//!
//! ```no_run
//! use flowbridge_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("integrations: {}", config.integrations.len());
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{BridgeConfig, IntegrationConfig};

/// Load the XDG hierarchy plus environment overrides, then validate.
pub fn load_and_validate() -> Result<BridgeConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load a single file plus environment overrides, then validate.
pub fn load_and_validate_path(path: &Path) -> Result<BridgeConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        read_source(path.to_path_buf()).into_iter().collect()
    })
}

/// Load an inline TOML document (no files, no environment), then validate.
pub fn load_and_validate_str(toml_content: &str) -> Result<BridgeConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<BridgeConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<BridgeConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Contents of every config file that exists, keyed by the path figment reports.
fn collect_toml_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|d| d.join("flowbridge.toml"))
        .unwrap_or_else(|_| PathBuf::from("flowbridge.toml"));
    let user = dirs::config_dir().map(|d| d.join("flowbridge/flowbridge.toml"));
    let system = Some(PathBuf::from("/etc/flowbridge/flowbridge.toml"));

    std::iter::once(Some(local))
        .chain([user, system])
        .flatten()
        .filter_map(read_source)
        .collect()
}

fn read_source(path: PathBuf) -> Option<(String, String)> {
    let content = std::fs::read_to_string(&path).ok()?;
    Some((path.display().to_string(), content))
}
