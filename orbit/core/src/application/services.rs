// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Application wiring: one place that connects the task service to the
//! intent router and event bus, and fills the command registry.

use crate::application::command_registry::CommandRegistry;
use crate::application::commands::register_builtin_commands;
use crate::application::intent_router::IntentRouteRegistry;
use crate::application::task_service::TaskService;
use crate::domain::task::CreateTask;
use crate::infrastructure::event_bus::EventBus;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct OrbitServices {
    pub event_bus: Arc<dyn EventBus>,
    pub intents: Arc<IntentRouteRegistry>,
    pub tasks: Arc<TaskService>,
    pub commands: Arc<CommandRegistry>,
}

impl OrbitServices {
    pub fn new(event_bus: Arc<dyn EventBus>) -> anyhow::Result<Self> {
        let tasks = Arc::new(TaskService::new(event_bus.clone()));

        let intents = Arc::new(IntentRouteRegistry::new());
        intents.register::<CreateTask>(tasks.clone());

        let (filter, listener) = TaskService::created_task_listener();
        event_bus.subscribe(Arc::new(filter), Arc::new(listener))?;

        let commands = Arc::new(CommandRegistry::new());
        register_builtin_commands(&commands, intents.clone(), tasks.clone());

        info!(
            commands = commands.command_names().len(),
            intents = intents.route_names().len(),
            "Application services initialized"
        );

        Ok(Self {
            event_bus,
            intents,
            tasks,
            commands,
        })
    }
}
