// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Intent routing.
//!
//! Each payload type has at most one route. Handlers are stored type-erased
//! and recovered by downcasting the boxed payload at dispatch time.

use crate::domain::intent::{Intent, IntentHandler};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[async_trait]
trait IntentRoute: Send + Sync {
    async fn dispatch(&self, payload: Box<dyn Any + Send>, trace_id: Option<String>) -> anyhow::Result<()>;
}

struct TypedRoute<T: Send + 'static> {
    handler: Arc<dyn IntentHandler<T>>,
}

#[async_trait]
impl<T: Send + 'static> IntentRoute for TypedRoute<T> {
    async fn dispatch(&self, payload: Box<dyn Any + Send>, trace_id: Option<String>) -> anyhow::Result<()> {
        let payload = payload
            .downcast::<T>()
            .map_err(|_| anyhow::anyhow!("Intent payload is not a {}", type_name::<T>()))?;
        self.handler
            .handle(Intent {
                payload: *payload,
                trace_id,
            })
            .await
    }
}

struct RegisteredRoute {
    name: String,
    route: Arc<dyn IntentRoute>,
}

#[derive(Default)]
pub struct IntentRouteRegistry {
    routes: RwLock<HashMap<TypeId, RegisteredRoute>>,
}

impl IntentRouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route intents carrying `T` to `handler`, replacing any existing route.
    pub fn register<T: Send + 'static>(&self, handler: Arc<dyn IntentHandler<T>>) {
        let name = route_name::<T>();
        let previous = self.routes.write().insert(
            TypeId::of::<T>(),
            RegisteredRoute {
                name: name.clone(),
                route: Arc::new(TypedRoute { handler }),
            },
        );

        if previous.is_some() {
            warn!("Replaced intent route: {}", name);
        } else {
            info!("Registered intent route: {}", name);
        }
    }

    /// Dispatch an intent. `Ok(false)` when no route exists for its payload.
    pub async fn execute_intent<T: Send + 'static>(&self, intent: Intent<T>) -> Result<bool, IntentError> {
        let name = route_name::<T>();
        let route = self
            .routes
            .read()
            .get(&TypeId::of::<T>())
            .map(|r| r.route.clone());

        let Some(route) = route else {
            warn!("No route found for intent: {}", name);
            return Ok(false);
        };

        debug!(intent = %name, trace_id = ?intent.trace_id, "Dispatching intent");
        route
            .dispatch(Box::new(intent.payload), intent.trace_id)
            .await
            .map_err(|source| IntentError::Handler { intent: name, source })?;
        Ok(true)
    }

    pub fn has_route<T: 'static>(&self) -> bool {
        self.routes.read().contains_key(&TypeId::of::<T>())
    }

    pub fn route_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.routes.read().values().map(|r| r.name.clone()).collect();
        names.sort();
        names
    }
}

/// Lower-cased simple type name, e.g. `createtask` for `CreateTask`.
fn route_name<T: ?Sized>() -> String {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_lowercase()
}

#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    #[error("Error executing intent {intent}: {source}")]
    Handler {
        intent: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Ping;
    struct Unrouted;

    struct Recorder {
        seen: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl IntentHandler<Ping> for Recorder {
        async fn handle(&self, intent: Intent<Ping>) -> anyhow::Result<()> {
            self.seen.lock().push(intent.trace_id);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl IntentHandler<Ping> for Failing {
        async fn handle(&self, _intent: Intent<Ping>) -> anyhow::Result<()> {
            anyhow::bail!("boom")
        }
    }

    #[tokio::test]
    async fn test_routes_by_payload_type() {
        let registry = IntentRouteRegistry::new();
        let recorder = Arc::new(Recorder { seen: Mutex::new(Vec::new()) });
        registry.register::<Ping>(recorder.clone());

        assert!(registry.execute_intent(Intent::traced(Ping, "t-1")).await.unwrap());
        assert!(!registry.execute_intent(Intent::new(Unrouted)).await.unwrap());

        assert_eq!(*recorder.seen.lock(), vec![Some("t-1".to_string())]);
        assert_eq!(registry.route_names(), vec!["ping".to_string()]);
        assert!(registry.has_route::<Ping>());
        assert!(!registry.has_route::<Unrouted>());
    }

    #[tokio::test]
    async fn test_handler_errors_are_wrapped() {
        let registry = IntentRouteRegistry::new();
        registry.register::<Ping>(Arc::new(Failing));

        let err = registry.execute_intent(Intent::new(Ping)).await.unwrap_err();
        match err {
            IntentError::Handler { intent, source } => {
                assert_eq!(intent, "ping");
                assert_eq!(source.to_string(), "boom");
            }
        }
    }

    #[tokio::test]
    async fn test_reregistering_replaces_route() {
        let registry = IntentRouteRegistry::new();
        registry.register::<Ping>(Arc::new(Failing));
        registry.register::<Ping>(Arc::new(Recorder { seen: Mutex::new(Vec::new()) }));

        assert!(registry.execute_intent(Intent::new(Ping)).await.unwrap());
        assert_eq!(registry.route_names().len(), 1);
    }

    #[test]
    fn test_route_name_strips_path_and_generics() {
        assert_eq!(route_name::<crate::domain::task::CreateTask>(), "createtask");
        assert_eq!(route_name::<Vec<u8>>(), "vec");
    }
}
