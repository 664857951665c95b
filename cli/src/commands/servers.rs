// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Shell server management against a running service
//!
//! Commands: list, create, stop

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use crate::daemon::client::{CreateServerRequest, DaemonClient};

#[derive(Subcommand)]
pub enum ServersCommand {
    /// List shell servers and their state
    List,

    /// Create and start a shell server
    Create {
        /// Server name
        name: String,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value = "2223")]
        port: u16,

        #[arg(long, default_value = "admin")]
        username: String,

        #[arg(long, default_value = "password")]
        password: String,
    },

    /// Stop and remove a shell server
    Stop {
        /// Server name
        name: String,
    },
}

pub async fn handle_command(command: ServersCommand, host: &str, port: u16) -> Result<()> {
    let client = DaemonClient::new(host, port)?;

    match command {
        ServersCommand::List => {
            let servers = client.list_servers().await?;
            if servers.is_empty() {
                println!("{}", "No shell servers.".dimmed());
                return Ok(());
            }

            println!("{}", "Shell servers:".bold());
            for status in servers.values() {
                let state = if status.running {
                    "running".green()
                } else {
                    "stopped".yellow()
                };
                println!("  {:<16} {}:{}  {}", status.name, status.host, status.port, state);
            }
        }
        ServersCommand::Create {
            name,
            host,
            port,
            username,
            password,
        } => {
            let message = client
                .create_server(&CreateServerRequest {
                    name,
                    host,
                    port,
                    username,
                    password,
                })
                .await?;
            println!("{}", format!("✓ {}", message).green());
        }
        ServersCommand::Stop { name } => {
            let message = client.stop_server(&name).await?;
            println!("{}", format!("✓ {}", message).green());
        }
    }

    Ok(())
}
