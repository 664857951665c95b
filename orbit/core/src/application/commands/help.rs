// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

use crate::application::command_registry::{CommandHandler, CommandOutcome, CommandRegistry};
use crate::application::output::ShellOutput;
use async_trait::async_trait;
use colored::Colorize;
use std::sync::Weak;

/// Lists registered commands, or describes one.
pub struct HelpCommand {
    // Weak: the registry owns this handler
    registry: Weak<CommandRegistry>,
}

impl HelpCommand {
    pub fn new(registry: Weak<CommandRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl CommandHandler for HelpCommand {
    async fn execute(&self, args: &[String], out: &mut ShellOutput) -> anyhow::Result<CommandOutcome> {
        let registry = self
            .registry
            .upgrade()
            .ok_or_else(|| anyhow::anyhow!("command registry is no longer available"))?;

        if let Some(name) = args.first() {
            match registry.description(name) {
                Some(description) => {
                    out.println(format!("Command: {}", name));
                    out.println(format!("Description: {}", description));
                }
                None => out.println(format!("Unknown command: {}", name)),
            }
            return Ok(CommandOutcome::Completed(true));
        }

        out.newline();
        out.styled("Available Commands:".bold().cyan());
        out.styled("==================".bold().cyan());
        out.newline();

        for name in registry.command_names() {
            let padded = format!("  {:<15}", name);
            match registry.description(&name) {
                Some(description) if !description.is_empty() => {
                    out.println(format!("{} - {}", padded.green(), description));
                }
                _ => out.println(padded.green().to_string()),
            }
        }

        out.newline();
        out.styled("Type 'help <command>' for more information about a specific command.".yellow());
        Ok(CommandOutcome::Completed(true))
    }
}
