//! API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::{AgentError, AgentStep, RunOutput};
use crate::tools::ToolInfo;

/// Request to answer a question.
#[derive(Debug, Clone, Deserialize)]
pub struct RunRequest {
    /// The question to answer
    pub question: String,
}

/// Answer produced by a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    /// Unique run identifier
    pub run_id: Uuid,

    /// Final answer text
    pub output: String,

    /// Number of generation calls made
    pub iterations: usize,

    /// Tool dispatches in order
    pub steps: Vec<AgentStep>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunResponse {
    pub fn new(out: RunOutput, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: out.run_id,
            output: out.output,
            iterations: out.iterations,
            steps: out.steps,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Error body for a failed run.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,

    /// Machine-readable error kind
    pub kind: String,

    /// Iteration at which the run failed, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iteration: Option<usize>,

    /// Tool involved in the failure, when any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

impl From<&AgentError> for ErrorResponse {
    fn from(err: &AgentError) -> Self {
        let (iteration, tool) = match err {
            AgentError::Transport { iteration, .. } | AgentError::Cancelled { iteration } => {
                (Some(*iteration), None)
            }
            AgentError::ToolNotFound { iteration, tool }
            | AgentError::ToolExecution { iteration, tool, .. } => {
                (Some(*iteration), Some(tool.clone()))
            }
            _ => (None, None),
        };

        Self {
            error: err.to_string(),
            kind: err.kind().to_string(),
            iteration,
            tool,
        }
    }
}

/// Tool catalog response.
#[derive(Debug, Clone, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolInfo>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Iteration ceiling applied to every run
    pub max_iterations: usize,
}
