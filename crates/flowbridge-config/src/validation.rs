// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as URL schemes, duplicate integration names and non-zero timeouts.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::BridgeConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(validation("storage.database_path must not be empty".to_string()));
    }

    if config.gateway.enabled {
        if config.gateway.port == 0 {
            errors.push(validation(
                "gateway.port must be non-zero when the gateway is enabled".to_string(),
            ));
        }
        if config.gateway.host.trim().is_empty() {
            errors.push(validation("gateway.host must not be empty".to_string()));
        }
    }

    if let Some(url) = &config.gateway.outbound_url
        && !is_http_url(url)
    {
        errors.push(validation(format!(
            "gateway.outbound_url `{url}` must start with http:// or https://"
        )));
    }

    if let Some(url) = &config.ticketing.base_url
        && !is_http_url(url)
    {
        errors.push(validation(format!(
            "ticketing.base_url `{url}` must start with http:// or https://"
        )));
    }

    let mut seen_names = HashSet::new();
    for (i, integration) in config.integrations.iter().enumerate() {
        if integration.name.trim().is_empty() {
            errors.push(validation(format!("integrations[{i}].name must not be empty")));
        } else if !seen_names.insert(integration.name.as_str()) {
            errors.push(validation(format!(
                "duplicate integration name `{}` in [[integrations]] array",
                integration.name
            )));
        }

        if !is_http_url(&integration.base_url) {
            errors.push(validation(format!(
                "integrations[{i}].base_url `{}` must start with http:// or https://",
                integration.base_url
            )));
        }

        if integration.flow_slug.trim().is_empty() {
            errors.push(validation(format!(
                "integrations[{i}].flow_slug must not be empty"
            )));
        }

        if integration.request_timeout_secs == 0 {
            errors.push(validation(format!(
                "integrations[{i}].request_timeout_secs must be at least 1"
            )));
        }

        if !integration.keyword_restart.is_empty()
            && integration.keyword_restart == integration.keyword_finish
        {
            tracing::warn!(
                integration = integration.name.as_str(),
                "keyword_restart equals keyword_finish; restart is applied first"
            );
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validation(message: String) -> ConfigError {
    ConfigError::Validation { message }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
