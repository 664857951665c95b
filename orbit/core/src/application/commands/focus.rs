// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! `focus`: nested task console.
//!
//! ```text
//! > task add write report
//! Task added: write report
//! > task ls
//! Current tasks:
//! 1. write report (ID: task-...)
//! > start 1
//! > task del 1
//! > exit
//! ```

use crate::application::command_registry::{CommandHandler, CommandOutcome, InteractiveSession};
use crate::application::intent_router::IntentRouteRegistry;
use crate::application::output::ShellOutput;
use crate::application::task_service::TaskService;
use crate::domain::intent::Intent;
use crate::domain::task::{CreateTask, Task};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

pub struct FocusCommand {
    intents: Arc<IntentRouteRegistry>,
    tasks: Arc<TaskService>,
}

impl FocusCommand {
    pub fn new(intents: Arc<IntentRouteRegistry>, tasks: Arc<TaskService>) -> Self {
        Self { intents, tasks }
    }
}

#[async_trait]
impl CommandHandler for FocusCommand {
    async fn execute(&self, _args: &[String], _out: &mut ShellOutput) -> anyhow::Result<CommandOutcome> {
        Ok(CommandOutcome::Interactive(Box::new(FocusSession::new(
            self.intents.clone(),
            self.tasks.clone(),
        ))))
    }
}

/// One `focus` invocation. `start` and `task del` index into the list
/// printed by the last `task ls`.
pub struct FocusSession {
    intents: Arc<IntentRouteRegistry>,
    tasks: Arc<TaskService>,
    listed: Vec<Task>,
    exit: bool,
}

impl FocusSession {
    pub fn new(intents: Arc<IntentRouteRegistry>, tasks: Arc<TaskService>) -> Self {
        Self {
            intents,
            tasks,
            listed: Vec::new(),
            exit: false,
        }
    }

    /// Resolve a 1-based task number against the last listing.
    fn select(&self, number: &str, usage: &str, out: &mut ShellOutput) -> Option<Task> {
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            out.println(usage);
            return None;
        }

        let task = number
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| self.listed.get(index))
            .cloned();

        if task.is_none() {
            out.println(format!("Invalid task number: {}", number));
        }
        task
    }

    async fn add_task(&self, name: &str, out: &mut ShellOutput) -> anyhow::Result<()> {
        if name.is_empty() {
            out.println("Usage: task add <task_name>");
            return Ok(());
        }

        let routed = self
            .intents
            .execute_intent(Intent::new(CreateTask::new(name)))
            .await?;
        if !routed {
            warn!("CreateTask intent was not routed");
        }
        out.println(format!("Task added: {}", name));
        Ok(())
    }

    fn list_tasks(&mut self, out: &mut ShellOutput) {
        out.println("Current tasks:");
        self.listed = self.tasks.tasks();
        for (i, task) in self.listed.iter().enumerate() {
            out.println(format!("{}. {} (ID: {})", i + 1, task.name, task.id));
        }
    }
}

/// The trimmed argument text when `input` is `command` on its own or followed
/// by whitespace.
fn argument<'a>(input: &'a str, command: &str) -> Option<&'a str> {
    let rest = input.strip_prefix(command)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

#[async_trait]
impl InteractiveSession for FocusSession {
    async fn on_enter(&mut self, out: &mut ShellOutput) {
        self.exit = false;
        out.println("Entering interactive mode.");
    }

    async fn handle_input(&mut self, input: &str, out: &mut ShellOutput) -> anyhow::Result<()> {
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            self.exit = true;
            return Ok(());
        }

        if let Some(name) = argument(input, "task add") {
            self.add_task(name, out).await?;
        } else if input == "task ls" {
            self.list_tasks(out);
        } else if let Some(number) = argument(input, "start") {
            if let Some(task) = self.select(number, "Usage: start <task_number>", out) {
                out.println(format!("Starting task: {} (ID: {})", task.name, task.id));
            }
        } else if let Some(number) = argument(input, "task del") {
            if let Some(task) = self.select(number, "Usage: task del <task_number>", out) {
                self.tasks.delete_task(&task.id);
                self.listed.retain(|t| t.id != task.id);
                out.println(format!("Deleted task: {} (ID: {})", task.name, task.id));
            }
        } else {
            out.println(format!("Unknown command: {}", input));
        }
        Ok(())
    }

    fn should_exit(&self) -> bool {
        self.exit
    }

    async fn on_exit(&mut self, out: &mut ShellOutput) {
        out.println("Exiting interactive mode.");
    }
}
