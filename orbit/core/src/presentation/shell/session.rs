// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! One interactive shell, independent of the SSH transport.
//!
//! Bytes from the client go in through [`ShellSession::feed`]; the terminal
//! output to send back comes out as a [`SessionOutput`].

use super::completer::CommandCompleter;
use super::highlighter::{PlainHighlighter, ShellHighlighter};
use super::line_editor::{EditEvent, LineEditor};
use super::status::ShellStatusProvider;
use crate::application::command_registry::{CommandRegistry, CommandResult, InteractiveSession};
use crate::application::output::ShellOutput;
use colored::Colorize;
use std::sync::Arc;
use tracing::{error, info};

pub const MAIN_PROMPT: &str = "BIOS> ";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionOutput {
    pub bytes: Vec<u8>,
    pub terminated: bool,
}

struct ActiveCommand {
    session: Box<dyn InteractiveSession>,
    editor: LineEditor,
}

pub struct ShellSession {
    user: String,
    registry: Arc<CommandRegistry>,
    editor: LineEditor,
    active: Option<ActiveCommand>,
    status: Option<Arc<dyn ShellStatusProvider>>,
    terminated: bool,
}

impl ShellSession {
    pub fn new(
        user: impl Into<String>,
        registry: Arc<CommandRegistry>,
        highlighter: Arc<dyn ShellHighlighter>,
        status: Option<Arc<dyn ShellStatusProvider>>,
    ) -> Self {
        let completer = CommandCompleter::from_registry(&registry);
        Self {
            user: user.into(),
            editor: LineEditor::new(MAIN_PROMPT, highlighter, Some(completer)),
            registry,
            active: None,
            status,
            terminated: false,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn in_interactive_command(&self) -> bool {
        self.active.is_some()
    }

    /// Clear the screen, greet the user and show the first prompt.
    pub fn start(&mut self) -> SessionOutput {
        info!(user = %self.user, "Shell session started");
        if let Some(status) = &self.status {
            status.start();
        }

        let mut out = ShellOutput::new();
        out.clear_screen();
        out.styled("Welcome to the SSH shell!".bold().yellow());
        out.styled("Type 'help' for available commands or 'exit' to close the session.".bold().green());

        let mut bytes = out.take_bytes();
        let mut prompt = String::new();
        self.editor.begin_line(&mut prompt);
        bytes.extend_from_slice(prompt.as_bytes());

        SessionOutput {
            bytes,
            terminated: false,
        }
    }

    pub async fn feed(&mut self, input: &[u8]) -> SessionOutput {
        let mut bytes = Vec::new();

        for &byte in input {
            if self.terminated {
                break;
            }

            let mut echo = String::new();
            let event = match self.active.as_mut() {
                Some(active) => active.editor.feed_byte(byte, &mut echo),
                None => self.editor.feed_byte(byte, &mut echo),
            };
            bytes.extend_from_slice(echo.as_bytes());

            if let Some(event) = event {
                let mut out = ShellOutput::new();
                self.handle_event(event, &mut out).await;
                bytes.extend(out.take_bytes());

                if !self.terminated {
                    // the event may have switched editors; the next LF of a CRLF
                    // pair still belongs to this one
                    let editor = match self.active.as_mut() {
                        Some(active) => &mut active.editor,
                        None => &mut self.editor,
                    };
                    editor.set_after_cr(byte == b'\r');
                    let mut prompt = String::new();
                    editor.begin_line(&mut prompt);
                    bytes.extend_from_slice(prompt.as_bytes());
                }
            }
        }

        SessionOutput {
            bytes,
            terminated: self.terminated,
        }
    }

    /// End the session and stop its status ticker. Idempotent.
    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        if let Some(status) = &self.status {
            status.stop();
        }
        info!(user = %self.user, "Shell session terminated");
    }

    async fn handle_event(&mut self, event: EditEvent, out: &mut ShellOutput) {
        if self.active.is_some() {
            self.handle_interactive_event(event, out).await;
            return;
        }

        match event {
            EditEvent::Line(line) => {
                if line.trim().eq_ignore_ascii_case("exit") {
                    info!(user = %self.user, "User requested exit");
                    self.terminate();
                    return;
                }

                if let CommandResult::EnterInteractive(session) = self.registry.execute(&line, out).await {
                    self.enter_interactive(session, out).await;
                }

                if let Some(status) = &self.status {
                    out.println(status.status());
                }
            }
            EditEvent::Interrupt => {
                info!(user = %self.user, "User interrupted session (Ctrl+C)");
                self.terminate();
            }
            EditEvent::Eof => {
                info!(user = %self.user, "End of input reached (Ctrl+D)");
                self.terminate();
            }
        }
    }

    async fn enter_interactive(&mut self, mut session: Box<dyn InteractiveSession>, out: &mut ShellOutput) {
        session.on_enter(out).await;
        if session.should_exit() {
            session.on_exit(out).await;
            return;
        }

        let editor = LineEditor::new(session.prompt().to_string(), Arc::new(PlainHighlighter), None);
        self.active = Some(ActiveCommand { session, editor });
    }

    async fn handle_interactive_event(&mut self, event: EditEvent, out: &mut ShellOutput) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        let keep = match event {
            EditEvent::Line(line) => match active.session.handle_input(&line, out).await {
                Ok(()) => !active.session.should_exit(),
                Err(e) => {
                    // the command failed, so it gets no exit hook
                    error!("Error in interactive mode: {:#}", e);
                    out.println(format!("Error in interactive mode: {}", e));
                    return;
                }
            },
            EditEvent::Interrupt => {
                out.println("Interrupted. Exiting interactive mode.");
                false
            }
            EditEvent::Eof => {
                out.println("End of input. Exiting interactive mode.");
                false
            }
        };

        if keep {
            self.active = Some(active);
        } else {
            active.session.on_exit(out).await;
        }
    }
}

impl Drop for ShellSession {
    fn drop(&mut self) {
        if let Some(status) = &self.status {
            status.stop();
        }
    }
}
