// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! HTTP API: shell server management plus the actuator endpoints.
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | POST | `/api/shell-servers` | create and start a server |
//! | GET | `/api/shell-servers` | status of every server |
//! | DELETE | `/api/shell-servers/{name}` | stop and remove a server |
//! | GET | `/actuator/health` | liveness |
//! | GET | `/actuator/prometheus` | metrics exposition |

use crate::presentation::shell::{ShellServerFactory, ShellServerRegistry};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

pub struct ApiState {
    pub servers: Arc<ShellServerRegistry>,
    pub metrics: Option<PrometheusHandle>,
    pub start_time: Instant,
}

impl ApiState {
    pub fn new(servers: Arc<ShellServerRegistry>, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            servers,
            metrics,
            start_time: Instant::now(),
        }
    }
}

pub fn app(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/shell-servers", get(list_servers).post(create_server))
        .route("/api/shell-servers/{name}", axum::routing::delete(stop_server))
        .route("/actuator/health", get(health))
        .route("/actuator/prometheus", get(prometheus))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CreateServerParams {
    pub name: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    2223
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "password".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub running: bool,
}

async fn create_server(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<CreateServerParams>,
) -> impl IntoResponse {
    let properties = state.servers.defaults().with_endpoint(
        params.host.clone(),
        params.port,
        params.username,
        params.password,
    );

    match state.servers.create_and_start(&params.name, properties).await {
        Ok(_) => {
            info!("Server {} created via API", params.name);
            (
                StatusCode::OK,
                format!(
                    "Server {} created and started on {}:{}",
                    params.name, params.host, params.port
                ),
            )
        }
        Err(e) => {
            error!("Failed to create server: {}", e);
            (StatusCode::BAD_REQUEST, format!("Failed to create server: {}", e))
        }
    }
}

async fn list_servers(State(state): State<Arc<ApiState>>) -> Json<BTreeMap<String, ServerStatus>> {
    let status = state
        .servers
        .all_servers()
        .into_iter()
        .map(|(key, server)| {
            let properties = server.properties();
            (
                key,
                ServerStatus {
                    name: server.name().to_string(),
                    host: properties.host.clone(),
                    port: properties.port,
                    running: server.is_running(),
                },
            )
        })
        .collect();
    Json(status)
}

async fn stop_server(State(state): State<Arc<ApiState>>, Path(name): Path<String>) -> impl IntoResponse {
    match state.servers.remove_server(&name).await {
        Some(_) => (StatusCode::OK, format!("Server {} stopped and removed", name)),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}

async fn health(State(state): State<Arc<ApiState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "UP",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "shell_servers": state.servers.len(),
    }))
}

async fn prometheus(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "Metrics are disabled".to_string()),
    }
}
