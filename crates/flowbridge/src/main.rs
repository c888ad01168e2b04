// SPDX-FileCopyrightText: 2026 FlowBridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FlowBridge - bridges a messaging transport to Typebot conversational flows.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flowbridge_config::BridgeConfig;

/// FlowBridge - bridges a messaging transport to Typebot conversational flows.
#[derive(Parser, Debug)]
#[command(name = "flowbridge", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bridge.
    Serve,
    /// Validate the configuration and print a summary.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => flowbridge_config::load_and_validate_path(path),
        None => flowbridge_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            flowbridge_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("flowbridge: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig) => {
            print!("{}", config_summary(&config));
        }
        None => {
            println!("flowbridge: use --help for available commands");
        }
    }
}

fn config_summary(config: &BridgeConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "configuration OK");
    let _ = writeln!(out, "  agent: {} (log level {})", config.agent.name, config.agent.log_level);
    let _ = writeln!(out, "  database: {}", config.storage.database_path);
    if config.gateway.enabled {
        let _ = writeln!(out, "  gateway: {}:{}", config.gateway.host, config.gateway.port);
    } else {
        let _ = writeln!(out, "  gateway: disabled");
    }
    let _ = writeln!(
        out,
        "  ticketing: {}",
        config.ticketing.base_url.as_deref().unwrap_or("not configured")
    );
    let _ = writeln!(out, "  integrations: {}", config.integrations.len());
    for integration in &config.integrations {
        let _ = writeln!(
            out,
            "    - {} -> {} ({})",
            integration.name, integration.base_url, integration.flow_slug
        );
    }
    out
}
