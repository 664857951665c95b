// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

use crate::application::event_factory::EventFactory;
use crate::domain::events::{EventContext, EventListener, EventRecord, OnEvent, SemanticTier};
use crate::domain::intent::{Intent, IntentHandler};
use crate::domain::task::{CreateTask, Task, TaskEvent};
use crate::infrastructure::event_bus::EventBus;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

pub const TASK_SERVICE_SOURCE: &str = "TaskService";

/// In-memory task list driven by `CreateTask` intents.
pub struct TaskService {
    tasks: RwLock<Vec<Task>>,
    event_bus: Arc<dyn EventBus>,
    events: EventFactory,
}

impl TaskService {
    pub fn new(event_bus: Arc<dyn EventBus>) -> Self {
        Self {
            tasks: RwLock::new(Vec::new()),
            event_bus,
            events: EventFactory::new(TASK_SERVICE_SOURCE),
        }
    }

    /// Snapshot of all tasks in creation order
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.read().clone()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn delete_task(&self, id: &str) -> Option<Task> {
        let mut tasks = self.tasks.write();
        let index = tasks.iter().position(|t| t.id == id)?;
        let removed = tasks.remove(index);
        info!(task_id = %removed.id, "Deleted task: {}", removed.name);
        Some(removed)
    }

    /// Subscription for `created_task` events and the listener that logs them.
    pub fn created_task_listener() -> (OnEvent, CreatedTaskListener) {
        (
            OnEvent::new(TaskEvent::CreatedTask.event_name()),
            CreatedTaskListener,
        )
    }
}

#[async_trait]
impl IntentHandler<CreateTask> for TaskService {
    async fn handle(&self, intent: Intent<CreateTask>) -> anyhow::Result<()> {
        info!("Creating task with intent: {}", intent.payload.name);

        let task = Task::new(intent.payload.name);
        self.tasks.write().push(task.clone());

        let factory = match &intent.trace_id {
            Some(trace_id) => self.events.with_trace_id(trace_id.clone()),
            None => self.events.clone(),
        };
        let event = factory
            .create_event(TaskEvent::CreatedTask.event_name(), SemanticTier::Internal)
            .with_payload_entry("taskId", task.id.clone())
            .with_payload_entry("taskName", task.name.clone());

        if let Err(e) = self.event_bus.publish(event).await {
            self.tasks.write().retain(|t| t.id != task.id);
            warn!(task_id = %task.id, "Rolled back task '{}': {}", task.name, e);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Logs every `created_task` event it receives.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreatedTaskListener;

#[async_trait]
impl EventListener for CreatedTaskListener {
    async fn on_event(&self, context: &EventContext, event: &EventRecord) {
        info!(
            event_id = ?event.id,
            replay = context.is_replay(),
            "Received task created event: {}",
            serde_json::Value::Object(event.payload.clone())
        );
        if context.is_replay() {
            info!("This is a replayed event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::EventFilter;
    use crate::infrastructure::event_bus::StandardEventBus;
    use crate::infrastructure::repositories::InMemoryEventRepository;
    use parking_lot::Mutex;

    #[tokio::test]
    async fn test_create_task_publishes_event() {
        let bus = Arc::new(StandardEventBus::new(Arc::new(InMemoryEventRepository::new())));
        let service = TaskService::new(bus.clone());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let (filter, _) = TaskService::created_task_listener();
        bus.subscribe(
            Arc::new(filter),
            Arc::new(move |_: &EventContext, e: &EventRecord| sink.lock().push(e.clone())),
        )
        .unwrap();

        service
            .handle(Intent::traced(CreateTask::new("write report"), "trace-9"))
            .await
            .unwrap();

        let tasks = service.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "write report");

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].source, "TaskService");
        assert_eq!(seen[0].trace_id.as_deref(), Some("trace-9"));
        assert_eq!(seen[0].payload_str("taskId"), Some(tasks[0].id.as_str()));
        assert_eq!(seen[0].payload_str("taskName"), Some("write report"));
    }

    #[tokio::test]
    async fn test_delete_task() {
        let bus = Arc::new(StandardEventBus::new(Arc::new(InMemoryEventRepository::new())));
        let service = TaskService::new(bus);
        service.handle(Intent::new(CreateTask::new("a"))).await.unwrap();
        service.handle(Intent::new(CreateTask::new("b"))).await.unwrap();

        let first = service.tasks()[0].clone();
        assert_eq!(service.delete_task(&first.id), Some(first.clone()));
        assert!(service.delete_task(&first.id).is_none());
        assert_eq!(service.task_count(), 1);
        assert_eq!(service.tasks()[0].name, "b");
    }

    #[tokio::test]
    async fn test_failed_publish_leaves_no_task() {
        let bus = Arc::new(StandardEventBus::new(Arc::new(InMemoryEventRepository::new())));
        let service = TaskService::new(bus.clone());
        service.handle(Intent::new(CreateTask::new("kept"))).await.unwrap();

        bus.close();
        let result = service.handle(Intent::new(CreateTask::new("orphan"))).await;

        assert!(result.is_err());
        assert_eq!(service.task_count(), 1);
        assert_eq!(service.tasks()[0].name, "kept");
    }

    #[test]
    fn test_listener_filter_matches_created_task() {
        let (filter, _) = TaskService::created_task_listener();
        assert!(filter.matches(&EventRecord::new("created_task", "anyone")));
        assert!(!filter.matches(&EventRecord::new("deleted_task", "anyone")));
    }
}
