// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

use colored::Colorize;
use regex::Regex;
use std::sync::LazyLock;

static SQL_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(SELECT|FROM|WHERE|JOIN|ON|GROUP BY|ORDER BY|HAVING|INSERT|UPDATE|DELETE|CREATE|DROP|ALTER)\b",
    )
    .expect("keyword pattern is valid")
});

/// Styles the line being edited. The result is only displayed; the
/// submitted line is always the raw buffer.
pub trait ShellHighlighter: Send + Sync {
    fn highlight(&self, buffer: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl ShellHighlighter for PlainHighlighter {
    fn highlight(&self, buffer: &str) -> String {
        buffer.to_string()
    }
}

/// Bold blue SQL keywords.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlHighlighter;

impl ShellHighlighter for SqlHighlighter {
    fn highlight(&self, buffer: &str) -> String {
        let mut out = String::with_capacity(buffer.len() + 16);
        let mut last_end = 0;

        for m in SQL_KEYWORDS.find_iter(buffer) {
            out.push_str(&buffer[last_end..m.start()]);
            out.push_str(&m.as_str().bold().blue().to_string());
            last_end = m.end();
        }
        out.push_str(&buffer[last_end..]);
        out
    }
}
