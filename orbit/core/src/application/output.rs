// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

use colored::ColoredString;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Terminal output collected while a command runs.
///
/// Commands write plain `\n` line endings. The SSH channel is in raw mode, so
/// [`ShellOutput::take_bytes`] converts them to `\r\n` on the way out.
#[derive(Debug, Default, Clone)]
pub struct ShellOutput {
    buffer: String,
}

impl ShellOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn print(&mut self, text: impl AsRef<str>) {
        self.buffer.push_str(text.as_ref());
    }

    pub fn println(&mut self, text: impl AsRef<str>) {
        self.buffer.push_str(text.as_ref());
        self.buffer.push('\n');
    }

    pub fn newline(&mut self) {
        self.buffer.push('\n');
    }

    /// Print a colored line
    pub fn styled(&mut self, text: ColoredString) {
        self.println(text.to_string());
    }

    pub fn clear_screen(&mut self) {
        self.buffer.push_str(CLEAR_SCREEN);
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drain the buffer as terminal bytes with CRLF line endings.
    pub fn take_bytes(&mut self) -> Vec<u8> {
        let text = std::mem::take(&mut self.buffer);
        to_crlf(&text).into_bytes()
    }
}

pub(crate) fn to_crlf(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut previous = '\0';
    for c in text.chars() {
        if c == '\n' && previous != '\r' {
            out.push('\r');
        }
        out.push(c);
        previous = c;
    }
    out
}
