//! Incremental parser over a growing action stream.
//!
//! The agent runtime hands over the whole text received so far on every callback. A line is
//! confirmed once a newline follows it; only confirmed lines are parsed, and each distinct
//! line is parsed once per parser instance.

use std::collections::HashSet;

use canvas_observability::redact_text;
use serde_json::Value;

use crate::command::{MutationCommand, RootAlias};
use crate::error::{ActionsError, Result};
use crate::repair::repair_line;

/// What happened to one confirmed line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Parsed(MutationCommand),
    Repaired(MutationCommand),
    Dropped(ActionsError),
}

impl LineOutcome {
    pub fn command(&self) -> Option<&MutationCommand> {
        match self {
            LineOutcome::Parsed(cmd) | LineOutcome::Repaired(cmd) => Some(cmd),
            LineOutcome::Dropped(_) => None,
        }
    }

    fn into_command(self) -> Option<MutationCommand> {
        match self {
            LineOutcome::Parsed(cmd) | LineOutcome::Repaired(cmd) => Some(cmd),
            LineOutcome::Dropped(_) => None,
        }
    }
}

/// Parses one complete line: strict JSON first, then the repaired candidate.
pub fn parse_line(line: &str) -> LineOutcome {
    if let Ok(value) = serde_json::from_str::<Value>(line) {
        return match MutationCommand::from_tuple(value) {
            Ok(cmd) => LineOutcome::Parsed(cmd),
            Err(err) => LineOutcome::Dropped(err),
        };
    }
    let repaired = repair_line(line)
        .and_then(|candidate| serde_json::from_str::<Value>(&candidate).ok())
        .ok_or_else(|| ActionsError::InvalidJson(line.to_string()))
        .and_then(MutationCommand::from_tuple);
    match repaired {
        Ok(cmd) => LineOutcome::Repaired(cmd),
        Err(err) => LineOutcome::Dropped(err),
    }
}

#[derive(Debug, Default)]
pub struct ActionParser {
    alias: RootAlias,
    seen: HashSet<String>,
    /// Confirmed prefix of the last buffer, used to resume scanning after it.
    consumed: String,
}

impl ActionParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root_alias(alias: RootAlias) -> Self {
        Self {
            alias,
            ..Self::default()
        }
    }

    /// Returns the commands confirmed by this call, in text order.
    pub fn feed(&mut self, cumulative: &str) -> Vec<MutationCommand> {
        self.feed_detailed(cumulative)
            .into_iter()
            .filter_map(LineOutcome::into_command)
            .collect()
    }

    /// Treats `text` as the complete response: its last line is confirmed even without a
    /// trailing newline.
    pub fn finish(&mut self, text: &str) -> Vec<MutationCommand> {
        if text.ends_with('\n') {
            return self.feed(text);
        }
        let mut closed = String::with_capacity(text.len() + 1);
        closed.push_str(text);
        closed.push('\n');
        self.feed(&closed)
    }

    pub fn feed_detailed(&mut self, cumulative: &str) -> Vec<LineOutcome> {
        let Some(last_newline) = cumulative.rfind('\n') else {
            return Vec::new();
        };
        if !cumulative.starts_with(self.consumed.as_str()) {
            tracing::debug!(
                target: "canvas.actions",
                consumed = self.consumed.len(),
                "buffer is not an extension of the previous one, rescanning"
            );
            self.consumed.clear();
        }
        let start = self.consumed.len();
        if last_newline < start {
            return Vec::new();
        }

        let confirmed = &cumulative[start..=last_newline];
        let mut outcomes = Vec::new();
        for raw in confirmed.lines() {
            let line = raw.trim();
            if line.is_empty() || !self.seen.insert(line.to_string()) {
                continue;
            }
            let mut outcome = parse_line(line);
            match &mut outcome {
                LineOutcome::Parsed(cmd) => cmd.canonicalize_root(&self.alias),
                LineOutcome::Repaired(cmd) => {
                    cmd.canonicalize_root(&self.alias);
                    tracing::debug!(target: "canvas.actions", target_id = %cmd.target_id, "repaired action line");
                }
                LineOutcome::Dropped(err) => {
                    tracing::debug!(
                        target: "canvas.actions",
                        error_code = err.code(),
                        line = %redact_text(line),
                        "dropped action line"
                    );
                }
            }
            outcomes.push(outcome);
        }
        self.consumed.push_str(confirmed);
        outcomes
    }

    /// Number of distinct lines confirmed so far.
    pub fn confirmed_lines(&self) -> usize {
        self.seen.len()
    }
}
