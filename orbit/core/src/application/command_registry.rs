// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Shell command registry.
//!
//! Commands are registered under a lower-cased name plus any aliases; every
//! key points at the same handler. Interactive commands hand back a fresh
//! [`InteractiveSession`] per invocation, which the shell then drives line by
//! line until it asks to exit.

use crate::application::output::ShellOutput;
use crate::infrastructure::metrics;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
    pub aliases: Vec<String>,
    pub interactive: bool,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            aliases: Vec::new(),
            interactive: false,
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }
}

pub enum CommandOutcome {
    Completed(bool),
    Interactive(Box<dyn InteractiveSession>),
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(&self, args: &[String], out: &mut ShellOutput) -> anyhow::Result<CommandOutcome>;
}

/// State of one interactive command invocation.
#[async_trait]
pub trait InteractiveSession: Send {
    async fn on_enter(&mut self, out: &mut ShellOutput);

    async fn handle_input(&mut self, input: &str, out: &mut ShellOutput) -> anyhow::Result<()>;

    fn should_exit(&self) -> bool;

    async fn on_exit(&mut self, out: &mut ShellOutput);

    fn prompt(&self) -> &str {
        "> "
    }
}

pub enum CommandResult {
    /// Blank input
    Ignored,
    Failed,
    Completed(bool),
    EnterInteractive(Box<dyn InteractiveSession>),
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandResult::Completed(true) | CommandResult::EnterInteractive(_))
    }
}

struct RegisteredCommand {
    spec: CommandSpec,
    handler: Arc<dyn CommandHandler>,
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: RwLock<HashMap<String, Arc<RegisteredCommand>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, spec: CommandSpec, handler: Arc<dyn CommandHandler>) {
        let command = Arc::new(RegisteredCommand {
            spec: spec.clone(),
            handler,
        });

        let mut commands = self.commands.write();
        commands.insert(spec.name.to_lowercase(), command.clone());
        info!("Registered command: {}", spec.name);

        for alias in &spec.aliases {
            commands.insert(alias.to_lowercase(), command.clone());
            info!("Registered alias '{}' for command '{}'", alias, spec.name);
        }
    }

    pub async fn execute(&self, line: &str, out: &mut ShellOutput) -> CommandResult {
        let mut parts = line.split_whitespace();
        let Some(first) = parts.next() else {
            return CommandResult::Ignored;
        };
        let name = first.to_lowercase();
        let args: Vec<String> = parts.map(str::to_string).collect();

        let command = self.commands.read().get(&name).cloned();
        let Some(command) = command else {
            out.println(format!("Unknown command: {}", name));
            metrics::record_command(&name, "unknown");
            return CommandResult::Failed;
        };

        match command.handler.execute(&args, out).await {
            Ok(CommandOutcome::Completed(ok)) => {
                metrics::record_command(&command.spec.name, if ok { "ok" } else { "failed" });
                CommandResult::Completed(ok)
            }
            Ok(CommandOutcome::Interactive(session)) if command.spec.interactive => {
                metrics::record_command(&command.spec.name, "ok");
                CommandResult::EnterInteractive(session)
            }
            Ok(CommandOutcome::Interactive(_)) => {
                metrics::record_command(&command.spec.name, "ok");
                CommandResult::Completed(true)
            }
            Err(e) => {
                error!("Error executing command '{}': {:#}", name, e);
                out.println(format!("Error executing command: {}", e));
                metrics::record_command(&command.spec.name, "error");
                CommandResult::Failed
            }
        }
    }

    /// Every registered key (names and aliases), sorted
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn description(&self, name: &str) -> Option<String> {
        self.commands
            .read()
            .get(&name.to_lowercase())
            .map(|c| c.spec.description.clone())
    }

    pub fn spec(&self, name: &str) -> Option<CommandSpec> {
        self.commands
            .read()
            .get(&name.to_lowercase())
            .map(|c| c.spec.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl CommandHandler for Echo {
        async fn execute(&self, args: &[String], out: &mut ShellOutput) -> anyhow::Result<CommandOutcome> {
            out.println(args.join(" "));
            Ok(CommandOutcome::Completed(true))
        }
    }

    struct Broken;

    #[async_trait]
    impl CommandHandler for Broken {
        async fn execute(&self, _args: &[String], _out: &mut ShellOutput) -> anyhow::Result<CommandOutcome> {
            anyhow::bail!("disk on fire")
        }
    }

    struct Nested;

    #[async_trait]
    impl InteractiveSession for Nested {
        async fn on_enter(&mut self, _out: &mut ShellOutput) {}
        async fn handle_input(&mut self, _input: &str, _out: &mut ShellOutput) -> anyhow::Result<()> {
            Ok(())
        }
        fn should_exit(&self) -> bool {
            true
        }
        async fn on_exit(&mut self, _out: &mut ShellOutput) {}
    }

    struct Opener;

    #[async_trait]
    impl CommandHandler for Opener {
        async fn execute(&self, _args: &[String], _out: &mut ShellOutput) -> anyhow::Result<CommandOutcome> {
            Ok(CommandOutcome::Interactive(Box::new(Nested)))
        }
    }

    #[tokio::test]
    async fn test_aliases_and_case_insensitivity() {
        let registry = CommandRegistry::new();
        registry.register(
            CommandSpec::new("Echo", "Echo the input text").with_aliases(["say"]),
            Arc::new(Echo),
        );

        let mut out = ShellOutput::new();
        assert!(matches!(registry.execute("SAY hello   world", &mut out).await, CommandResult::Completed(true)));
        assert_eq!(out.as_str(), "hello world\n");

        assert_eq!(registry.command_names(), vec!["echo", "say"]);
        assert_eq!(registry.description("ECHO").as_deref(), Some("Echo the input text"));
        assert_eq!(registry.spec("say").map(|s| s.name), Some("Echo".to_string()));
    }

    #[tokio::test]
    async fn test_blank_and_unknown_lines() {
        let registry = CommandRegistry::new();
        let mut out = ShellOutput::new();

        assert!(matches!(registry.execute("   ", &mut out).await, CommandResult::Ignored));
        assert!(out.is_empty());

        assert!(matches!(registry.execute("Frobnicate now", &mut out).await, CommandResult::Failed));
        assert_eq!(out.as_str(), "Unknown command: frobnicate\n");
    }

    #[tokio::test]
    async fn test_handler_error_is_reported() {
        let registry = CommandRegistry::new();
        registry.register(CommandSpec::new("broken", "Always fails"), Arc::new(Broken));

        let mut out = ShellOutput::new();
        let result = registry.execute("broken", &mut out).await;
        assert!(matches!(result, CommandResult::Failed));
        assert!(!result.is_success());
        assert_eq!(out.as_str(), "Error executing command: disk on fire\n");
    }

    #[tokio::test]
    async fn test_interactive_flag_gates_sessions() {
        let registry = CommandRegistry::new();
        registry.register(CommandSpec::new("nest", "Nested").interactive(), Arc::new(Opener));
        registry.register(CommandSpec::new("flat", "Not interactive"), Arc::new(Opener));

        let mut out = ShellOutput::new();
        assert!(matches!(registry.execute("nest", &mut out).await, CommandResult::EnterInteractive(_)));
        assert!(matches!(registry.execute("flat", &mut out).await, CommandResult::Completed(true)));
    }
}
