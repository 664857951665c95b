// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;
use thinkorbit_core::application::services::OrbitServices;
use thinkorbit_core::infrastructure::event_bus::StandardEventBus;
use thinkorbit_core::infrastructure::repositories::InMemoryEventRepository;
use thinkorbit_core::presentation::shell::highlighter::SqlHighlighter;
use thinkorbit_core::presentation::shell::ShellSession;

fn services() -> OrbitServices {
    let bus = Arc::new(StandardEventBus::new(Arc::new(InMemoryEventRepository::new())));
    OrbitServices::new(bus).unwrap()
}

fn shell(services: &OrbitServices) -> ShellSession {
    ShellSession::new("admin", services.commands.clone(), Arc::new(SqlHighlighter), None)
}

async fn send(shell: &mut ShellSession, input: &str) -> String {
    let output = shell.feed(input.as_bytes()).await;
    String::from_utf8_lossy(&output.bytes).to_string()
}

#[tokio::test]
async fn builtin_commands_are_available() {
    let services = services();
    let mut shell = shell(&services);
    shell.start();

    let help = send(&mut shell, "help\r").await;
    for name in ["clear", "date", "echo", "focus", "help", "memory", "mem", "cls"] {
        assert!(help.contains(name), "help output is missing {}", name);
    }

    let echo = send(&mut shell, "echo  orbit   ready\r").await;
    assert!(echo.contains("orbit ready\r\n"));

    let unknown = send(&mut shell, "warp 9\r").await;
    assert!(unknown.contains("Unknown command: warp"));
}

#[tokio::test]
async fn focus_session_manages_tasks() {
    let services = services();
    let mut shell = shell(&services);
    shell.start();

    let entered = send(&mut shell, "focus\r").await;
    assert!(entered.contains("Entering interactive mode."));
    assert!(entered.ends_with("> \x1b[K"));
    assert!(shell.in_interactive_command());

    let added = send(&mut shell, "task add deploy relay\r").await;
    assert!(added.contains("Task added: deploy relay"));
    assert_eq!(services.tasks.tasks().len(), 1);

    let listed = send(&mut shell, "task ls\r").await;
    assert!(listed.contains("1. deploy relay (ID: task-"));

    let exited = send(&mut shell, "exit\r").await;
    assert!(exited.contains("Exiting interactive mode."));
    assert!(exited.ends_with("BIOS> \x1b[K"));
    assert!(!shell.in_interactive_command());
    assert!(!shell.is_terminated());
}

#[tokio::test]
async fn ctrl_c_leaves_interactive_mode_then_ends_session() {
    let services = services();
    let mut shell = shell(&services);
    shell.start();

    send(&mut shell, "focus\r").await;
    let interrupted = send(&mut shell, "\x03").await;
    assert!(interrupted.contains("Interrupted. Exiting interactive mode."));
    assert!(!shell.is_terminated());

    send(&mut shell, "focus\r").await;
    let eof = send(&mut shell, "\x04").await;
    assert!(eof.contains("End of input. Exiting interactive mode."));

    let output = shell.feed(b"\x03").await;
    assert!(output.terminated);
}

#[tokio::test]
async fn sessions_do_not_share_interactive_state() {
    let services = services();
    let mut first = shell(&services);
    let mut second = shell(&services);
    first.start();
    second.start();

    send(&mut first, "focus\r").await;
    assert!(first.in_interactive_command());
    assert!(!second.in_interactive_command());

    send(&mut first, "task add shared\r").await;
    send(&mut first, "task ls\r").await;

    send(&mut second, "focus\r").await;
    // nothing listed in this session yet
    let started = send(&mut second, "start 1\r").await;
    assert!(started.contains("Invalid task number: 1"));
}

#[tokio::test]
async fn crlf_clients_drive_focus_without_blank_lines() {
    let services = services();
    let mut shell = shell(&services);
    shell.start();

    let entered = send(&mut shell, "focus\r\n").await;
    assert!(entered.contains("Entering interactive mode."));
    assert!(!entered.contains("Unknown command"));
    assert_eq!(entered.matches("> \x1b[K").count(), 1);

    let listed = send(&mut shell, "task add relay\r\ntask ls\r\n").await;
    assert!(!listed.contains("Unknown command"));
    assert!(listed.contains("1. relay (ID: task-"));

    let exited = send(&mut shell, "exit\r\n").await;
    assert!(exited.contains("Exiting interactive mode."));
    assert_eq!(exited.matches("BIOS> ").count(), 1);
    assert!(!shell.in_interactive_command());
}
