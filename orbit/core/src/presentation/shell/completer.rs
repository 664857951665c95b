// Copyright (c) 2026 ThinkOrbit Contributors
// SPDX-License-Identifier: AGPL-3.0

use crate::application::command_registry::CommandRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    NoMatch,
    /// Single candidate, already followed by a space
    Complete(String),
    /// Several candidates sharing `prefix`
    Ambiguous { prefix: String, candidates: Vec<String> },
}

/// Completes the first word of a line against command names.
#[derive(Debug, Clone, Default)]
pub struct CommandCompleter {
    words: Vec<String>,
}

impl CommandCompleter {
    pub fn new(words: impl IntoIterator<Item = String>) -> Self {
        let mut words: Vec<String> = words.into_iter().collect();
        words.sort();
        words.dedup();
        Self { words }
    }

    /// Registered command names plus the built-in `exit`.
    pub fn from_registry(registry: &CommandRegistry) -> Self {
        let mut words = registry.command_names();
        words.push("exit".to_string());
        Self::new(words)
    }

    pub fn complete(&self, word: &str) -> Completion {
        let candidates: Vec<String> = self
            .words
            .iter()
            .filter(|w| w.starts_with(word))
            .cloned()
            .collect();

        match candidates.len() {
            0 => Completion::NoMatch,
            1 => Completion::Complete(format!("{} ", candidates[0])),
            _ => Completion::Ambiguous {
                prefix: common_prefix(&candidates),
                candidates,
            },
        }
    }
}

fn common_prefix(words: &[String]) -> String {
    let Some(first) = words.first() else {
        return String::new();
    };
    let mut len = first.len();
    for word in &words[1..] {
        len = first
            .char_indices()
            .zip(word.chars())
            .take_while(|((_, a), b)| a == b)
            .map(|((i, a), _)| i + a.len_utf8())
            .last()
            .unwrap_or(0)
            .min(len);
    }
    first[..len].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completer() -> CommandCompleter {
        CommandCompleter::new(["help", "h", "echo", "exit", "memory", "mem"].map(String::from))
    }

    #[test]
    fn test_unique_match_adds_space() {
        assert_eq!(completer().complete("ec"), Completion::Complete("echo ".to_string()));
    }

    #[test]
    fn test_ambiguous_match_extends_prefix() {
        match completer().complete("me") {
            Completion::Ambiguous { prefix, candidates } => {
                assert_eq!(prefix, "mem");
                assert_eq!(candidates, vec!["mem", "memory"]);
            }
            other => panic!("unexpected completion: {:?}", other),
        }
    }

    #[test]
    fn test_no_match() {
        assert_eq!(completer().complete("zz"), Completion::NoMatch);
    }
}
