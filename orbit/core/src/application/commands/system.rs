// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! System commands: date, memory, clear, echo.

use crate::application::command_registry::{CommandHandler, CommandOutcome};
use crate::application::output::ShellOutput;
use async_trait::async_trait;
use chrono::Local;
use colored::Colorize;
use sysinfo::{Pid, ProcessesToUpdate, System};

const MB: u64 = 1024 * 1024;

pub struct DateCommand;

#[async_trait]
impl CommandHandler for DateCommand {
    async fn execute(&self, _args: &[String], out: &mut ShellOutput) -> anyhow::Result<CommandOutcome> {
        let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        out.println(format!("{}{}", "Current date and time: ".bold(), now.green()));
        Ok(CommandOutcome::Completed(true))
    }
}

/// Process resident memory plus host memory totals.
pub struct MemoryCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub process_resident: u64,
    pub process_virtual: u64,
    pub system_total: u64,
    pub system_used: u64,
    pub system_available: u64,
}

impl MemorySnapshot {
    pub fn capture() -> Self {
        let mut system = System::new();
        system.refresh_memory();

        let pid = Pid::from_u32(std::process::id());
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), false);
        let (process_resident, process_virtual) = system
            .process(pid)
            .map(|p| (p.memory(), p.virtual_memory()))
            .unwrap_or((0, 0));

        Self {
            process_resident,
            process_virtual,
            system_total: system.total_memory(),
            system_used: system.used_memory(),
            system_available: system.available_memory(),
        }
    }
}

#[async_trait]
impl CommandHandler for MemoryCommand {
    async fn execute(&self, _args: &[String], out: &mut ShellOutput) -> anyhow::Result<CommandOutcome> {
        let snapshot = tokio::task::spawn_blocking(MemorySnapshot::capture).await?;

        out.newline();
        out.styled("Memory Usage Information".bold().cyan());
        out.styled("========================".bold().cyan());
        out.newline();

        out.styled("Process Memory:".bold());
        out.println(format!("  Resident:  {} MB", snapshot.process_resident / MB));
        out.println(format!("  Virtual:   {} MB", snapshot.process_virtual / MB));

        out.newline();
        out.styled("System Memory:".bold());
        out.println(format!("  Used:      {} MB", snapshot.system_used / MB));
        out.println(format!("  Total:     {} MB", snapshot.system_total / MB));
        out.println(format!("  Available: {} MB", snapshot.system_available / MB));
        Ok(CommandOutcome::Completed(true))
    }
}

pub struct ClearCommand;

#[async_trait]
impl CommandHandler for ClearCommand {
    async fn execute(&self, _args: &[String], out: &mut ShellOutput) -> anyhow::Result<CommandOutcome> {
        out.clear_screen();
        Ok(CommandOutcome::Completed(true))
    }
}

pub struct EchoCommand;

#[async_trait]
impl CommandHandler for EchoCommand {
    async fn execute(&self, args: &[String], out: &mut ShellOutput) -> anyhow::Result<CommandOutcome> {
        out.println(args.join(" "));
        Ok(CommandOutcome::Completed(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_joins_args() {
        let mut out = ShellOutput::new();
        let args = vec!["hello".to_string(), "world".to_string()];
        EchoCommand.execute(&args, &mut out).await.unwrap();
        assert_eq!(out.as_str(), "hello world\n");

        let mut out = ShellOutput::new();
        EchoCommand.execute(&[], &mut out).await.unwrap();
        assert_eq!(out.as_str(), "\n");
    }

    #[tokio::test]
    async fn test_date_format() {
        let mut out = ShellOutput::new();
        DateCommand.execute(&[], &mut out).await.unwrap();
        assert!(out.as_str().contains("Current date and time: "));
        let year = Local::now().format("%Y").to_string();
        assert!(out.as_str().contains(&year));
    }

    #[tokio::test]
    async fn test_memory_report() {
        let mut out = ShellOutput::new();
        MemoryCommand.execute(&[], &mut out).await.unwrap();
        assert!(out.as_str().contains("Memory Usage Information"));
        assert!(out.as_str().contains("Total:"));
    }

    #[test]
    fn test_memory_snapshot_sees_host() {
        let snapshot = MemorySnapshot::capture();
        assert!(snapshot.system_total > 0);
        assert!(snapshot.system_available <= snapshot.system_total);
    }
}
