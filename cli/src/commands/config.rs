// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use thinkorbit_core::domain::orbit_config::OrbitConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./thinkorbit-config.yaml")]
        output: PathBuf,

        /// Include every section with comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(&output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = OrbitConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. THINKORBIT_CONFIG_PATH: {}",
            std::env::var("THINKORBIT_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./thinkorbit-config.yaml");
        println!("  4. ~/.thinkorbit/config.yaml");
        println!("  5. /etc/thinkorbit/config.yaml");
        println!();
    }

    let spec = &config.spec;
    println!("{}", format!("Current configuration ({}):", config.metadata.name).bold());
    println!();

    println!("{}", "SSH Shell:".bold());
    println!("  Enabled: {}", spec.shell.enabled);
    println!("  Listen: {}:{}", spec.shell.host, spec.shell.port);
    println!("  Username: {}", spec.shell.username);
    println!("  Host key: {}", spec.shell.host_key_path.display());
    if let Some(keys) = &spec.shell.authorized_keys_path {
        println!("  Authorized keys: {}", keys.display());
    }
    println!("  Inactivity timeout: {}s", spec.shell.inactivity_timeout_secs);
    println!();

    println!("{}", "Event Store:".bold());
    match &spec.database.url {
        Some(_) => {
            println!("  Backend: PostgreSQL");
            println!("  Max connections: {}", spec.database.max_connections);
            println!("  Run migrations: {}", spec.database.run_migrations);
        }
        None => println!("  Backend: in-memory"),
    }
    println!("  Replay page size: {}", spec.event_bus.replay_page_size);
    println!();

    println!("{}", "HTTP API:".bold());
    println!("  Enabled: {}", spec.api.enabled);
    println!("  Listen: {}:{}", spec.api.bind_address, spec.api.port);
    println!("  Metrics: {}", spec.metrics.enabled);
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = OrbitConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn template(with_examples: bool) -> &'static str {
    if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    }
}

async fn generate(output: &Path, with_examples: bool) -> Result<()> {
    std::fs::write(output, template(with_examples))
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse_and_validate() {
        for with_examples in [false, true] {
            let manifest = OrbitConfigManifest::from_yaml_str(template(with_examples)).unwrap();
            manifest.validate().unwrap();
        }
    }

    #[tokio::test]
    async fn test_generate_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("thinkorbit-config.yaml");
        generate(&output, false).await.unwrap();

        let manifest = OrbitConfigManifest::from_yaml_file(&output).unwrap();
        assert_eq!(manifest.spec.shell.port, 2222);
    }
}
