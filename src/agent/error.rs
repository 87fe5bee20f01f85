use thiserror::Error;

use super::prompt::TemplateError;
use crate::llm::LlmError;

/// Why a run terminated without an answer. Iterations are 1-based.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Prompt template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Generation failed at iteration {iteration}: {source}")]
    Transport {
        iteration: usize,
        #[source]
        source: LlmError,
    },

    #[error("Tool '{tool}' not found (iteration {iteration})")]
    ToolNotFound { iteration: usize, tool: String },

    #[error("Tool '{tool}' failed at iteration {iteration}: {source}")]
    ToolExecution {
        iteration: usize,
        tool: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("No final answer within {max_iterations} iterations")]
    BudgetExceeded { max_iterations: usize },

    #[error("Run cancelled at iteration {iteration}")]
    Cancelled { iteration: usize },

    #[error("max_iterations must be at least 1")]
    InvalidBudget,
}

impl AgentError {
    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Template(_) => "template",
            Self::Transport { .. } => "transport",
            Self::ToolNotFound { .. } => "tool_not_found",
            Self::ToolExecution { .. } => "tool_execution",
            Self::BudgetExceeded { .. } => "budget_exceeded",
            Self::Cancelled { .. } => "cancelled",
            Self::InvalidBudget => "invalid_budget",
        }
    }
}
