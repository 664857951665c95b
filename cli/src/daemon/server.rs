// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Service wiring and lifecycle

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use thinkorbit_core::{
    application::services::OrbitServices,
    domain::{
        orbit_config::OrbitConfigManifest,
        repository::{EventRepository, StorageBackend},
    },
    infrastructure::{
        db::Database,
        event_bus::{EventBus, StandardEventBus},
        metrics,
        repositories::{InMemoryEventRepository, PostgresEventRepository},
    },
    presentation::{
        api::{app, ApiState},
        shell::{
            highlighter::SqlHighlighter, ShellContext, ShellServerFactory, ShellServerProperties,
            ShellServerRegistry,
        },
    },
};

/// Open the configured event store, applying migrations when enabled.
pub async fn open_repository(config: &OrbitConfigManifest) -> Result<Arc<dyn EventRepository>> {
    match config.spec.database.storage_backend() {
        StorageBackend::PostgreSQL(pg) => {
            let database = Database::new(&pg)
                .await
                .context("Failed to connect to PostgreSQL")?;
            if config.spec.database.run_migrations {
                database.migrate().await.context("Failed to apply migrations")?;
                info!("Event store migrations applied");
            }
            info!("Using PostgreSQL event store");
            Ok(Arc::new(PostgresEventRepository::new(database.get_pool().clone())))
        }
        StorageBackend::InMemory => {
            warn!("No database configured, events are kept in memory only");
            Ok(Arc::new(InMemoryEventRepository::new()))
        }
    }
}

pub async fn start_daemon(config_path: Option<PathBuf>) -> Result<()> {
    let config = OrbitConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config.validate().context("Configuration validation failed")?;

    info!("Configuration loaded: name={}", config.metadata.name);

    let metrics_handle = if config.spec.metrics.enabled {
        Some(metrics::install_recorder().context("Failed to install metrics recorder")?)
    } else {
        None
    };

    let repository = open_repository(&config).await?;
    let event_bus: Arc<dyn EventBus> = Arc::new(StandardEventBus::with_page_size(
        repository,
        config.spec.event_bus.replay_page_size,
    ));
    let services = OrbitServices::new(event_bus.clone()).context("Failed to initialize services")?;

    // shell clients always get ANSI output, whatever our own stdout is
    colored::control::set_override(true);

    let context = ShellContext::new(services.commands.clone(), Arc::new(SqlHighlighter));
    let servers = Arc::new(ShellServerRegistry::new(
        ShellServerProperties::from_configuration(&config.spec.shell),
        context,
    ));

    if config.spec.shell.enabled {
        servers.start_default_server().await;
    } else {
        info!("Default shell server disabled");
    }

    let served = if config.spec.api.enabled {
        serve_api(&config, servers.clone(), metrics_handle).await
    } else {
        shutdown_signal().await;
        Ok(())
    };

    info!("ThinkOrbit shutting down");
    servers.shutdown().await;
    event_bus.close();

    served
}

async fn serve_api(
    config: &OrbitConfigManifest,
    servers: Arc<ShellServerRegistry>,
    metrics_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> Result<()> {
    let router = app(Arc::new(ApiState::new(servers, metrics_handle)));

    let addr = format!("{}:{}", config.spec.api.bind_address, config.spec.api.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("HTTP API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
