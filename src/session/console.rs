//! The session console: a bounded log of what every command did.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsoleEntry {
    pub level: ConsoleLevel,
    /// type tag of the action that produced the entry
    pub action: &'static str,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl fmt::Display for ConsoleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.level {
            ConsoleLevel::Log => "✓",
            ConsoleLevel::Error => "✗",
        };
        write!(f, "{} [{}] {}", marker, self.action, self.message)
    }
}

/// Oldest entries are dropped once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct Console {
    entries: VecDeque<ConsoleEntry>,
    capacity: usize,
}

impl Console {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    fn push(&mut self, level: ConsoleLevel, action: &'static str, message: String) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ConsoleEntry {
            level,
            action,
            message,
            at: Utc::now(),
        });
    }

    pub fn log(&mut self, action: &'static str, message: impl Into<String>) {
        self.push(ConsoleLevel::Log, action, message.into());
    }

    pub fn error(&mut self, action: &'static str, message: impl Into<String>) {
        self.push(ConsoleLevel::Error, action, message.into());
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConsoleEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&ConsoleEntry> {
        self.entries.back()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ConsoleEntry> {
        self.entries.iter().filter(|e| e.level == ConsoleLevel::Error)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_and_error() {
        let mut console = Console::new(10);
        console.log("ADD_FILE", "A new file was added.");
        console.error("STAGE_FILE", "file #1 is already staged");

        assert_eq!(console.len(), 2);
        assert_eq!(console.errors().count(), 1);
        let last = console.last().unwrap();
        assert_eq!(last.level, ConsoleLevel::Error);
        assert_eq!(last.to_string(), "✗ [STAGE_FILE] file #1 is already staged");
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut console = Console::new(2);
        console.log("ADD_FILE", "one");
        console.log("ADD_FILE", "two");
        console.log("ADD_FILE", "three");

        let messages: Vec<&str> = console.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut console = Console::new(0);
        console.log("CREATE_COMMIT", "a");
        console.log("CREATE_COMMIT", "b");
        assert_eq!(console.len(), 1);
        console.clear();
        assert!(console.is_empty());
    }
}
