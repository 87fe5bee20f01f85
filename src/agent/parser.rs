//! Extraction of action and final-answer directives from model output.
//!
//! Recognized lines (labels are case-sensitive and must start the line):
//!
//! ```text
//! Action: <tool name>
//! Action Input: <input>          (surrounding double quotes are stripped)
//! Final Answer: <answer>         (the rest of that line)
//! ```
//!
//! Anything else is ordinary text. Only the first occurrence of each label
//! counts, even when its value is empty.

use serde::Serialize;

const ACTION: &str = "Action";
const ACTION_INPUT: &str = "Action Input";
const FINAL_ANSWER: &str = "Final Answer";

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub tool: String,
    pub input: String,
}

/// Directives found in one block of model output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parsed {
    pub action: Option<Action>,
    pub final_answer: Option<String>,
}

impl Parsed {
    pub fn is_empty(&self) -> bool {
        self.action.is_none() && self.final_answer.is_none()
    }
}

/// Scan `text` line by line for directives.
pub fn parse(text: &str) -> Parsed {
    let mut tool: Option<&str> = None;
    let mut input: Option<&str> = None;
    let mut final_answer: Option<&str> = None;

    for line in text.lines() {
        if tool.is_none() {
            if let Some(value) = labeled(line, ACTION) {
                tool = Some(value);
                continue;
            }
        }
        if input.is_none() {
            if let Some(value) = labeled(line, ACTION_INPUT) {
                input = Some(value);
                continue;
            }
        }
        if final_answer.is_none() {
            final_answer = labeled(line, FINAL_ANSWER);
        }
    }

    let action = match (tool, input) {
        (Some(tool), Some(input)) if !tool.is_empty() => Some(Action {
            tool: tool.to_string(),
            input: strip_quotes(input).to_string(),
        }),
        _ => None,
    };

    Parsed {
        action,
        final_answer: final_answer.filter(|a| !a.is_empty()).map(str::to_string),
    }
}

/// Value after `label:` when `line` starts with exactly that label.
fn labeled<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.strip_prefix(label)?
        .strip_prefix(':')
        .map(str::trim)
}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}
