// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

use super::properties::ShellServerProperties;
use super::server::{ShellContext, ShellServer, ShellServerError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const DEFAULT_SERVER_NAME: &str = "default";

/// Creates and owns named shell servers.
#[async_trait]
pub trait ShellServerFactory: Send + Sync {
    /// Create a server from the default properties.
    fn create_server(&self, name: &str) -> Arc<ShellServer>;

    /// Create a server with explicit properties. An existing name returns
    /// the existing instance unchanged.
    fn create_server_with(&self, name: &str, properties: ShellServerProperties) -> Arc<ShellServer>;

    fn get_server(&self, name: &str) -> Option<Arc<ShellServer>>;

    fn all_servers(&self) -> HashMap<String, Arc<ShellServer>>;

    /// Remove a server, stopping it first if it is running.
    async fn remove_server(&self, name: &str) -> Option<Arc<ShellServer>>;

    /// Stop and remove every server.
    async fn shutdown(&self);
}

pub struct ShellServerRegistry {
    servers: DashMap<String, Arc<ShellServer>>,
    defaults: ShellServerProperties,
    context: ShellContext,
}

impl ShellServerRegistry {
    pub fn new(defaults: ShellServerProperties, context: ShellContext) -> Self {
        Self {
            servers: DashMap::new(),
            defaults,
            context,
        }
    }

    pub fn defaults(&self) -> &ShellServerProperties {
        &self.defaults
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Create and start the `default` server. Failure is logged, not fatal.
    pub async fn start_default_server(&self) -> Option<Arc<ShellServer>> {
        info!("Starting default shell server...");
        let server = self.create_server(DEFAULT_SERVER_NAME);
        match server.start().await {
            Ok(()) => {
                info!("Default shell server started successfully");
                Some(server)
            }
            Err(e) => {
                error!("Failed to start default shell server: {}", e);
                None
            }
        }
    }

    /// Create a server with explicit properties and start it. A server that
    /// fails to start is not kept.
    pub async fn create_and_start(
        &self,
        name: &str,
        properties: ShellServerProperties,
    ) -> Result<Arc<ShellServer>, ShellServerError> {
        let existed = self.servers.contains_key(name);
        let server = self.create_server_with(name, properties);
        if let Err(e) = server.start().await {
            if !existed {
                self.servers.remove(name);
            }
            return Err(e);
        }
        Ok(server)
    }
}

#[async_trait]
impl ShellServerFactory for ShellServerRegistry {
    fn create_server(&self, name: &str) -> Arc<ShellServer> {
        self.create_server_with(name, self.defaults.clone())
    }

    fn create_server_with(&self, name: &str, properties: ShellServerProperties) -> Arc<ShellServer> {
        self.servers
            .entry(name.to_string())
            .and_modify(|_| {
                warn!("Server with name [{}] already exists, returning existing instance", name);
            })
            .or_insert_with(|| {
                info!(
                    "Creating new ShellServer [{}] with configuration: host={}, port={}",
                    name, properties.host, properties.port
                );
                Arc::new(ShellServer::new(name, properties, self.context.clone()))
            })
            .clone()
    }

    fn get_server(&self, name: &str) -> Option<Arc<ShellServer>> {
        self.servers.get(name).map(|entry| entry.value().clone())
    }

    fn all_servers(&self) -> HashMap<String, Arc<ShellServer>> {
        self.servers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    async fn remove_server(&self, name: &str) -> Option<Arc<ShellServer>> {
        let (_, server) = self.servers.remove(name)?;
        if server.is_running() {
            server.stop().await;
        }
        Some(server)
    }

    async fn shutdown(&self) {
        info!("Shutting down all shell servers...");
        let servers: Vec<Arc<ShellServer>> = self.servers.iter().map(|e| e.value().clone()).collect();
        self.servers.clear();

        for server in servers {
            if server.is_running() {
                server.stop().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::command_registry::CommandRegistry;
    use crate::presentation::shell::highlighter::PlainHighlighter;

    fn registry() -> ShellServerRegistry {
        let context = ShellContext::new(Arc::new(CommandRegistry::new()), Arc::new(PlainHighlighter));
        ShellServerRegistry::new(ShellServerProperties::default(), context)
    }

    #[tokio::test]
    async fn test_existing_name_returns_same_instance() {
        let registry = registry();
        let first = registry.create_server("ops");
        let custom = registry.defaults().with_endpoint("127.0.0.1", 2999, "a", "b");
        let second = registry.create_server_with("ops", custom);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.properties().port, 2222);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_and_shutdown() {
        let registry = registry();
        registry.create_server("a");
        registry.create_server("b");

        assert!(registry.get_server("a").is_some());
        assert_eq!(registry.all_servers().len(), 2);

        assert!(registry.remove_server("a").await.is_some());
        assert!(registry.remove_server("a").await.is_none());

        registry.shutdown().await;
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_failed_start_is_not_kept() {
        let registry = registry();
        let mut properties = registry.defaults().clone();
        properties.host_key_path = "/nonexistent/think_id_rsa".into();
        properties.port = 0;

        assert!(registry.create_and_start("broken", properties).await.is_err());
        assert!(registry.get_server("broken").is_none());
    }
}
