// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Built-in shell commands.

pub mod focus;
pub mod help;
pub mod system;

use crate::application::command_registry::{CommandRegistry, CommandSpec};
use crate::application::intent_router::IntentRouteRegistry;
use crate::application::task_service::TaskService;
use std::sync::Arc;

pub use focus::FocusCommand;
pub use help::HelpCommand;
pub use system::{ClearCommand, DateCommand, EchoCommand, MemoryCommand};

/// Register every built-in command on `registry`.
pub fn register_builtin_commands(
    registry: &Arc<CommandRegistry>,
    intents: Arc<IntentRouteRegistry>,
    tasks: Arc<TaskService>,
) {
    registry.register(
        CommandSpec::new("help", "Display help information").with_aliases(["?", "h"]),
        Arc::new(HelpCommand::new(Arc::downgrade(registry))),
    );
    registry.register(
        CommandSpec::new("date", "Display current date and time"),
        Arc::new(DateCommand),
    );
    registry.register(
        CommandSpec::new("memory", "Display memory usage information").with_aliases(["mem"]),
        Arc::new(MemoryCommand),
    );
    registry.register(
        CommandSpec::new("clear", "Clear the terminal screen").with_aliases(["cls"]),
        Arc::new(ClearCommand),
    );
    registry.register(
        CommandSpec::new("echo", "Echo the input text"),
        Arc::new(EchoCommand),
    );
    registry.register(
        CommandSpec::new("focus", "Interactive task console").interactive(),
        Arc::new(FocusCommand::new(intents, tasks)),
    );
}
