// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! # ThinkOrbit CLI
//!
//! The `thinkorbit` binary runs the service and talks to a running one.
//!
//! - `thinkorbit --daemon` runs the event bus, SSH shell and HTTP API in the
//!   foreground until Ctrl+C or SIGTERM
//! - `thinkorbit config show|validate|generate` manages configuration
//! - `thinkorbit update [--dry-run]` applies event store migrations
//! - `thinkorbit debug events` exercises publish, subscribe and replay
//! - `thinkorbit servers list|create|stop` drives the HTTP API

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

mod commands;
mod daemon;

use commands::{ConfigCommand, DebugCommand, ServersCommand};

/// ThinkOrbit - event-driven service with an SSH operator shell
#[derive(Parser)]
#[command(name = "thinkorbit")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Run the service in the foreground
    #[arg(long, global = true)]
    daemon: bool,

    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "THINKORBIT_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API host used by client subcommands
    #[arg(long, global = true, env = "THINKORBIT_HOST", default_value = "127.0.0.1")]
    host: String,

    /// HTTP API port used by client subcommands
    #[arg(long, global = true, env = "THINKORBIT_PORT", default_value = "8080")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "THINKORBIT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Apply event store migrations
    #[command(name = "update")]
    Update {
        #[command(flatten)]
        command: commands::UpdateCommand,
    },

    /// Diagnostics against an in-process event bus
    #[command(name = "debug")]
    Debug {
        #[command(subcommand)]
        command: DebugCommand,
    },

    /// Manage shell servers on a running service
    #[command(name = "servers")]
    Servers {
        #[command(subcommand)]
        command: ServersCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    if cli.daemon {
        info!("Starting ThinkOrbit in daemon mode");
        return daemon::start_daemon(cli.config).await;
    }

    match cli.command {
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Update { command }) => {
            commands::update::execute(command, cli.config).await
        }
        Some(Commands::Debug { command }) => {
            commands::debug::handle_command(command, cli.config).await
        }
        Some(Commands::Servers { command }) => {
            commands::servers::handle_command(command, &cli.host, cli.port).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
