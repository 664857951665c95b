// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Prometheus metrics.
//!
//! Components record through the `metrics` facade. The daemon installs the
//! Prometheus recorder once and the actuator renders it. Without a recorder
//! every call below is a no-op.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use parking_lot::Mutex;

pub const EVENTS_PUBLISHED: &str = "thinkorbit_events_published_total";
pub const EVENTS_REPLAYED: &str = "thinkorbit_events_replayed_total";
pub const COMMANDS_EXECUTED: &str = "thinkorbit_commands_executed_total";
pub const SHELL_SERVERS_RUNNING: &str = "thinkorbit_shell_servers_running";
pub const SHELL_SESSIONS: &str = "thinkorbit_shell_sessions_total";

static HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Install the global Prometheus recorder. Repeated calls return the handle
/// of the first installation.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let mut guard = HANDLE.lock();
    if let Some(handle) = guard.as_ref() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    describe();
    *guard = Some(handle.clone());
    Ok(handle)
}

/// Handle of the installed recorder, if any.
pub fn handle() -> Option<PrometheusHandle> {
    HANDLE.lock().clone()
}

fn describe() {
    metrics::describe_counter!(EVENTS_PUBLISHED, "Events persisted and dispatched by the event bus");
    metrics::describe_counter!(EVENTS_REPLAYED, "Events delivered during replays");
    metrics::describe_counter!(COMMANDS_EXECUTED, "Shell commands executed, by command and status");
    metrics::describe_gauge!(SHELL_SERVERS_RUNNING, "SSH shell servers currently accepting connections");
    metrics::describe_counter!(SHELL_SESSIONS, "SSH shell sessions opened");
}

pub fn record_event_published(event_type: &str) {
    metrics::counter!(EVENTS_PUBLISHED, "event_type" => event_type.to_string()).increment(1);
}

pub fn record_events_replayed(count: u64) {
    metrics::counter!(EVENTS_REPLAYED).increment(count);
}

pub fn record_command(command: &str, status: &'static str) {
    metrics::counter!(COMMANDS_EXECUTED, "command" => command.to_string(), "status" => status)
        .increment(1);
}

pub fn shell_server_started() {
    metrics::gauge!(SHELL_SERVERS_RUNNING).increment(1.0);
}

pub fn shell_server_stopped() {
    metrics::gauge!(SHELL_SERVERS_RUNNING).decrement(1.0);
}

pub fn record_shell_session(server: &str) {
    metrics::counter!(SHELL_SESSIONS, "server" => server.to_string()).increment(1);
}
