//! Per-run state and the pure transition applied to each model reply.

use super::parser::{self, Action};

/// State of one run: the question, the transcript appended after the
/// instruction block, and how many generation calls have been made.
///
/// Transitions consume the state and return the next one; the transcript
/// only ever grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentState {
    question: String,
    transcript: Vec<String>,
    iteration: usize,
}

/// What the loop must do after a model reply has been folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    /// Dispatch `action`; if `then_answer` is set the run finishes with it
    /// once the observation is recorded.
    Dispatch {
        action: Action,
        then_answer: Option<String>,
    },
    /// Finish with this answer.
    Finish(String),
    /// Nothing recognized; ask the model again.
    Continue,
}

impl AgentState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            transcript: Vec::new(),
            iteration: 0,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Number of model replies folded in so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Record a raw model reply and decide the next step from that reply alone.
    ///
    /// An action always takes precedence over a final answer in the same reply.
    pub fn with_model_output(mut self, raw: String) -> (Self, NextStep) {
        let parsed = parser::parse(&raw);
        self.transcript.push(raw);
        self.iteration += 1;

        let next = match (parsed.action, parsed.final_answer) {
            (Some(action), then_answer) => NextStep::Dispatch {
                action,
                then_answer,
            },
            (None, Some(answer)) => NextStep::Finish(answer),
            (None, None) => NextStep::Continue,
        };
        (self, next)
    }

    /// Record a tool observation.
    pub fn with_observation(mut self, observation: &str) -> Self {
        self.transcript.push(format_observation(observation));
        self
    }

    pub fn into_transcript(self) -> Vec<String> {
        self.transcript
    }
}

pub fn format_observation(observation: &str) -> String {
    format!("Observation: {}", observation.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_reply_requests_dispatch() {
        let (state, next) = AgentState::new("2+2?")
            .with_model_output("Action: calculator\nAction Input: 2+2".to_string());
        assert_eq!(state.iteration(), 1);
        assert_eq!(state.transcript().len(), 1);
        assert_eq!(
            next,
            NextStep::Dispatch {
                action: Action {
                    tool: "calculator".to_string(),
                    input: "2+2".to_string()
                },
                then_answer: None,
            }
        );
    }

    #[test]
    fn action_takes_precedence_over_answer() {
        let (_, next) = AgentState::new("q")
            .with_model_output("Action: a\nAction Input: b\nFinal Answer: c".to_string());
        match next {
            NextStep::Dispatch { then_answer, .. } => assert_eq!(then_answer.as_deref(), Some("c")),
            other => panic!("expected dispatch, got {:?}", other),
        }
    }

    #[test]
    fn only_latest_reply_is_parsed() {
        let (state, _) = AgentState::new("q").with_model_output("Final Answer: stale".to_string());
        // A reply without directives continues even though the transcript
        // already holds a final answer.
        let (state, next) = state.with_model_output("Thought: hmm".to_string());
        assert_eq!(next, NextStep::Continue);
        assert_eq!(state.iteration(), 2);
    }

    #[test]
    fn transcript_grows_with_replies_and_observations() {
        let (state, _) = AgentState::new("q")
            .with_model_output("Action: a\nAction Input: b".to_string());
        let state = state.with_observation("  result \n");
        let (state, _) = state.with_model_output("Thought: still thinking".to_string());

        assert_eq!(
            state.transcript(),
            &[
                "Action: a\nAction Input: b".to_string(),
                "Observation: result".to_string(),
                "Thought: still thinking".to_string(),
            ]
        );
        assert_eq!(state.iteration(), 2);
    }
}
