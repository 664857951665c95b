// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: format!("task-{}", Uuid::new_v4().simple()),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Event types emitted by the task service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    CreatedTask,
}

impl TaskEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            TaskEvent::CreatedTask => "created_task",
        }
    }
}

/// Intent payload asking for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTask {
    pub name: String,
}

impl CreateTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
