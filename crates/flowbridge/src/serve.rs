// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `flowbridge serve` command implementation.
//!
//! Opens the SQLite store, starts the HTTP gateway, builds one Typebot
//! engine per configured integration and runs the bridge loop until a
//! shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use flowbridge_agent::{BridgeLoop, BridgeService, shutdown};
use flowbridge_config::BridgeConfig;
use flowbridge_core::{BridgeError, ChannelAdapter, ConversationStore, PluginAdapter, TicketingAdapter};
use flowbridge_gateway::{GatewayChannel, HttpTicketing};
use flowbridge_storage::SqliteStorage;
use flowbridge_typebot::TypebotEngine;
use tracing::{info, warn};

/// Runs the `flowbridge serve` command.
pub async fn run_serve(config: BridgeConfig) -> Result<(), BridgeError> {
    init_tracing(&config.agent.log_level);

    info!(agent_name = config.agent.name.as_str(), "starting flowbridge serve");

    if !config.gateway.enabled {
        return Err(BridgeError::Config(
            "gateway.enabled is false; the gateway is the only inbound channel".into(),
        ));
    }
    if config.integrations.is_empty() {
        return Err(BridgeError::Config(
            "no [[integrations]] configured; nothing would answer inbound messages".into(),
        ));
    }

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let storage: Arc<dyn ConversationStore> = Arc::new(storage);

    let mut gateway = GatewayChannel::new(config.gateway.clone())?;
    gateway.connect().await?;
    let gateway = Arc::new(gateway);

    let ticketing = HttpTicketing::from_config(&config.ticketing)?
        .map(|t| Arc::new(t) as Arc<dyn TicketingAdapter>);
    if ticketing.is_none() {
        warn!("ticketing.base_url not set; ownership changes stay local");
    }

    let mut service = BridgeService::new(
        gateway.clone() as Arc<dyn ChannelAdapter>,
        storage,
        ticketing,
    );
    for integration in &config.integrations {
        let engine = TypebotEngine::new(integration)?;
        service = service.with_integration(integration.clone(), Arc::new(engine));
    }

    let cancel = shutdown::install_signal_handler();
    let bridge = BridgeLoop::new(
        Arc::new(service),
        Duration::from_secs(config.agent.drain_timeout_secs),
    );
    bridge.run(cancel).await?;

    gateway.shutdown().await?;
    info!("flowbridge serve shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("flowbridge={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
