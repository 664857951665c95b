// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Line editing over a raw SSH channel.
//!
//! The client sends keystrokes byte by byte and echoes nothing locally, so
//! the editor owns the visible line: every change redraws the prompt and the
//! highlighted buffer, then moves the cursor back into place.

use super::completer::{CommandCompleter, Completion};
use super::highlighter::ShellHighlighter;
use std::collections::VecDeque;
use std::sync::Arc;

pub const HISTORY_LIMIT: usize = 100;

const CTRL_A: u8 = 0x01;
const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;
const CTRL_E: u8 = 0x05;
const BACKSPACE: u8 = 0x08;
const TAB: u8 = 0x09;
const LF: u8 = 0x0A;
const CTRL_L: u8 = 0x0C;
const CR: u8 = 0x0D;
const CTRL_U: u8 = 0x15;
const ESC: u8 = 0x1B;
const DEL: u8 = 0x7F;

const BELL: &str = "\x07";
const ERASE_TO_END: &str = "\x1b[K";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

fn is_control(byte: u8) -> bool {
    byte < 0x20 || byte == DEL
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    Line(String),
    /// Ctrl+C
    Interrupt,
    /// Ctrl+D on an empty line
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Escape {
    None,
    Started,
    Csi(String),
    Ss3,
}

pub struct LineEditor {
    prompt: String,
    buffer: Vec<char>,
    cursor: usize,
    history: VecDeque<String>,
    history_index: Option<usize>,
    stashed: Vec<char>,
    escape: Escape,
    utf8: Vec<u8>,
    last_was_cr: bool,
    highlighter: Arc<dyn ShellHighlighter>,
    completer: Option<CommandCompleter>,
}

impl LineEditor {
    pub fn new(
        prompt: impl Into<String>,
        highlighter: Arc<dyn ShellHighlighter>,
        completer: Option<CommandCompleter>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            buffer: Vec::new(),
            cursor: 0,
            history: VecDeque::new(),
            history_index: None,
            stashed: Vec::new(),
            escape: Escape::None,
            utf8: Vec::new(),
            last_was_cr: false,
            highlighter,
            completer,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn buffer(&self) -> String {
        self.buffer.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    /// Tell the editor whether the previous byte of the stream was a CR, so a
    /// trailing LF is not taken as a second Enter after switching editors.
    pub fn set_after_cr(&mut self, after_cr: bool) {
        self.last_was_cr = after_cr;
    }

    /// Draw the prompt for a fresh line.
    pub fn begin_line(&mut self, out: &mut String) {
        self.redraw(out);
    }

    /// Process one input byte, writing terminal output to `out`.
    pub fn feed_byte(&mut self, byte: u8, out: &mut String) -> Option<EditEvent> {
        let after_cr = std::mem::replace(&mut self.last_was_cr, false);

        if self.escape != Escape::None {
            if !is_control(byte) && self.feed_escape(byte, out) {
                return None;
            }
            // control bytes and unknown introducers abandon the sequence
            self.escape = Escape::None;
        }

        if byte >= 0x80 {
            self.feed_utf8(byte, out);
            return None;
        }

        if !self.utf8.is_empty() {
            self.utf8.clear();
            out.push_str(BELL);
        }

        match byte {
            CR => {
                self.last_was_cr = true;
                Some(self.submit(out))
            }
            LF if after_cr => None,
            LF => Some(self.submit(out)),
            CTRL_C => {
                out.push_str("^C\r\n");
                self.reset_line();
                Some(EditEvent::Interrupt)
            }
            CTRL_D if self.buffer.is_empty() => {
                out.push_str("\r\n");
                Some(EditEvent::Eof)
            }
            CTRL_D => {
                self.delete_at_cursor(out);
                None
            }
            CTRL_A => {
                self.cursor = 0;
                self.redraw(out);
                None
            }
            CTRL_E => {
                self.cursor = self.buffer.len();
                self.redraw(out);
                None
            }
            CTRL_U => {
                self.buffer.drain(..self.cursor);
                self.cursor = 0;
                self.redraw(out);
                None
            }
            CTRL_L => {
                out.push_str(CLEAR_SCREEN);
                self.redraw(out);
                None
            }
            BACKSPACE | DEL => {
                if self.cursor == 0 {
                    out.push_str(BELL);
                } else {
                    self.cursor -= 1;
                    self.buffer.remove(self.cursor);
                    self.redraw(out);
                }
                None
            }
            TAB => {
                self.complete(out);
                None
            }
            ESC => {
                self.escape = Escape::Started;
                None
            }
            0x20..=0x7E => {
                self.insert(byte as char, out);
                None
            }
            // other control bytes are ignored
            _ => None,
        }
    }

    fn feed_utf8(&mut self, byte: u8, out: &mut String) {
        self.utf8.push(byte);
        match std::str::from_utf8(&self.utf8) {
            Ok(text) => {
                let chars: Vec<char> = text.chars().collect();
                self.utf8.clear();
                for c in chars {
                    self.insert(c, out);
                }
            }
            Err(e) if e.error_len().is_some() || self.utf8.len() >= 4 => {
                self.utf8.clear();
                out.push_str(BELL);
            }
            // incomplete sequence, wait for more bytes
            Err(_) => {}
        }
    }

    /// Returns false when `byte` does not belong to the pending sequence.
    fn feed_escape(&mut self, byte: u8, out: &mut String) -> bool {
        let state = std::mem::replace(&mut self.escape, Escape::None);
        match state {
            Escape::Started => match byte {
                b'[' => self.escape = Escape::Csi(String::new()),
                b'O' => self.escape = Escape::Ss3,
                _ => return false,
            },
            Escape::Ss3 => self.apply_key(byte, "", out),
            Escape::Csi(mut params) => {
                if byte.is_ascii_digit() || byte == b';' {
                    params.push(byte as char);
                    self.escape = Escape::Csi(params);
                } else {
                    self.apply_key(byte, &params, out);
                }
            }
            Escape::None => return false,
        }
        true
    }

    fn apply_key(&mut self, key: u8, params: &str, out: &mut String) {
        match (key, params) {
            (b'A', _) => self.history_previous(out),
            (b'B', _) => self.history_next(out),
            (b'C', _) => {
                if self.cursor < self.buffer.len() {
                    self.cursor += 1;
                    self.redraw(out);
                }
            }
            (b'D', _) => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.redraw(out);
                }
            }
            (b'H', _) | (b'~', "1") | (b'~', "7") => {
                self.cursor = 0;
                self.redraw(out);
            }
            (b'F', _) | (b'~', "4") | (b'~', "8") => {
                self.cursor = self.buffer.len();
                self.redraw(out);
            }
            (b'~', "3") => self.delete_at_cursor(out),
            _ => {}
        }
    }

    fn insert(&mut self, c: char, out: &mut String) {
        self.buffer.insert(self.cursor, c);
        self.cursor += 1;
        self.redraw(out);
    }

    fn delete_at_cursor(&mut self, out: &mut String) {
        if self.cursor < self.buffer.len() {
            self.buffer.remove(self.cursor);
            self.redraw(out);
        } else {
            out.push_str(BELL);
        }
    }

    fn submit(&mut self, out: &mut String) -> EditEvent {
        out.push_str("\r\n");
        let line: String = self.buffer.iter().collect();
        if !line.trim().is_empty() {
            if self.history.len() == HISTORY_LIMIT {
                self.history.pop_front();
            }
            self.history.push_back(line.clone());
        }
        self.reset_line();
        EditEvent::Line(line)
    }

    fn reset_line(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.history_index = None;
        self.stashed.clear();
    }

    fn history_previous(&mut self, out: &mut String) {
        let index = match self.history_index {
            None if !self.history.is_empty() => {
                self.stashed = self.buffer.clone();
                self.history.len() - 1
            }
            Some(i) if i > 0 => i - 1,
            _ => {
                out.push_str(BELL);
                return;
            }
        };
        self.show_history(index, out);
    }

    fn history_next(&mut self, out: &mut String) {
        match self.history_index {
            Some(i) if i + 1 < self.history.len() => self.show_history(i + 1, out),
            Some(_) => {
                self.history_index = None;
                self.buffer = std::mem::take(&mut self.stashed);
                self.cursor = self.buffer.len();
                self.redraw(out);
            }
            None => out.push_str(BELL),
        }
    }

    fn show_history(&mut self, index: usize, out: &mut String) {
        if let Some(entry) = self.history.get(index) {
            self.history_index = Some(index);
            self.buffer = entry.chars().collect();
            self.cursor = self.buffer.len();
            self.redraw(out);
        }
    }

    fn complete(&mut self, out: &mut String) {
        let Some(completer) = &self.completer else {
            out.push_str(BELL);
            return;
        };

        let word: String = self.buffer[..self.cursor].iter().collect();
        if word.chars().any(char::is_whitespace) {
            out.push_str(BELL);
            return;
        }

        match completer.complete(&word) {
            Completion::NoMatch => out.push_str(BELL),
            Completion::Complete(replacement) => self.replace_word(&replacement, out),
            Completion::Ambiguous { prefix, candidates } => {
                if prefix.chars().count() > word.chars().count() {
                    self.replace_word(&prefix, out);
                } else {
                    out.push_str("\r\n");
                    out.push_str(&candidates.join("  "));
                    out.push_str("\r\n");
                    self.redraw(out);
                }
            }
        }
    }

    fn replace_word(&mut self, replacement: &str, out: &mut String) {
        let rest = self.buffer.split_off(self.cursor);
        self.buffer = replacement.chars().collect();
        self.cursor = self.buffer.len();
        self.buffer.extend(rest);
        self.redraw(out);
    }

    fn redraw(&self, out: &mut String) {
        let line: String = self.buffer.iter().collect();
        out.push('\r');
        out.push_str(&self.prompt);
        out.push_str(&self.highlighter.highlight(&line));
        out.push_str(ERASE_TO_END);
        let behind = self.buffer.len() - self.cursor;
        if behind > 0 {
            out.push_str(&format!("\x1b[{}D", behind));
        }
    }
}
