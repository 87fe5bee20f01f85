//! Core agent loop implementation.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::llm::{GenerationPipeline, LlmError, OpenRouterClient};
use crate::tools::{ToolContext, ToolLookup, ToolRegistry};

use super::error::AgentError;
use super::parser::Action;
use super::prompt::{PromptBuilder, PromptTemplate};
use super::state::{AgentState, NextStep};

/// Per-agent runtime settings.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Ceiling on generation calls per run
    pub max_iterations: usize,

    /// Working directory handed to tools
    pub workspace: PathBuf,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            workspace: PathBuf::from("."),
        }
    }
}

/// A dispatched action and the observation it produced.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStep {
    pub action: Action,
    pub observation: String,
}

/// Successful result of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub run_id: Uuid,

    /// The final answer text
    pub output: String,

    /// Generation calls made
    pub iterations: usize,

    /// Tool dispatches in order
    pub steps: Vec<AgentStep>,

    /// Every fragment appended after the instruction block
    pub transcript: Vec<String>,
}

impl RunOutput {
    /// Key-value view of the result.
    pub fn values(&self) -> Map<String, Value> {
        let mut values = Map::new();
        values.insert("output".to_string(), json!(self.output));
        values.insert("iterations".to_string(), json!(self.iterations));
        values.insert("run_id".to_string(), json!(self.run_id.to_string()));
        values
    }
}

/// The ReAct agent.
///
/// `run` keeps all mutable state local to the call, so one agent can serve
/// concurrent runs.
pub struct Agent {
    pipeline: Arc<dyn GenerationPipeline>,
    tools: ToolRegistry,
    prompt: PromptBuilder,
    options: AgentOptions,
}

impl Agent {
    /// Create an agent with the built-in instruction template.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::InvalidBudget` if `options.max_iterations` is zero.
    pub fn new(
        pipeline: Arc<dyn GenerationPipeline>,
        tools: ToolRegistry,
        options: AgentOptions,
    ) -> Result<Self, AgentError> {
        if options.max_iterations == 0 {
            return Err(AgentError::InvalidBudget);
        }
        let prompt = PromptBuilder::new(PromptTemplate::default(), &tools.list_tools());

        Ok(Self {
            pipeline,
            tools,
            prompt,
            options,
        })
    }

    /// Create an agent backed by the configured OpenRouter model and the
    /// default tool set.
    pub fn from_config(config: &Config) -> Result<Self, AgentError> {
        let client = OpenRouterClient::from_config(config);
        let tools = ToolRegistry::with_defaults(config.enable_shell_tool);

        Self::new(
            Arc::new(client),
            tools,
            AgentOptions {
                max_iterations: config.max_iterations,
                workspace: config.workspace_path.clone(),
            },
        )
    }

    /// Replace the instruction template.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.prompt = PromptBuilder::new(template, &self.tools.list_tools());
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn max_iterations(&self) -> usize {
        self.options.max_iterations
    }

    /// Answer `question`, dispatching tools until the model gives a final answer.
    ///
    /// Any failure ends the run; observations gathered so far are discarded.
    pub async fn run(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<RunOutput, AgentError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("agent_run", %run_id);

        let result = self.run_inner(run_id, question, cancel).instrument(span.clone()).await;

        match &result {
            Ok(out) => {
                tracing::info!(parent: &span, iterations = out.iterations, "Run finished with answer")
            }
            Err(e) => tracing::warn!(parent: &span, kind = e.kind(), "Run failed: {}", e),
        }
        result
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<RunOutput, AgentError> {
        tracing::info!(tools = self.tools.len(), "Starting run: {}", truncate_for_log(question, 200));

        let mut state = AgentState::new(question);
        let mut steps = Vec::new();
        let mut prompt = self.prompt.render(state.question(), state.transcript())?;

        loop {
            let iteration = state.iteration() + 1;
            if cancel.is_cancelled() {
                return Err(AgentError::Cancelled { iteration });
            }
            if iteration > self.options.max_iterations {
                return Err(AgentError::BudgetExceeded {
                    max_iterations: self.options.max_iterations,
                });
            }

            tracing::debug!(iteration, "Calling model");
            let raw = self.generate(&prompt, iteration, cancel).await?;
            tracing::debug!(iteration, "Model output: {}", truncate_for_log(&raw, 1000));

            let (next_state, next) = state.with_model_output(raw);
            state = next_state;

            let answer = match next {
                NextStep::Dispatch {
                    action,
                    then_answer,
                } => {
                    let observation = self.dispatch(&action, iteration, cancel).await?;
                    state = state.with_observation(&observation);
                    steps.push(AgentStep {
                        action,
                        observation,
                    });
                    then_answer
                }
                NextStep::Finish(answer) => Some(answer),
                NextStep::Continue => {
                    tracing::debug!(iteration, "No directive in model output");
                    None
                }
            };

            if let Some(output) = answer {
                return Ok(RunOutput {
                    run_id,
                    output,
                    iterations: state.iteration(),
                    steps,
                    transcript: state.into_transcript(),
                });
            }

            prompt = self.prompt.render(state.question(), state.transcript())?;
        }
    }

    async fn generate(
        &self,
        prompt: &str,
        iteration: usize,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let res = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AgentError::Cancelled { iteration }),
            res = self.pipeline.generate(prompt, cancel) => res,
        };

        res.map_err(|source| match source {
            LlmError::Cancelled => AgentError::Cancelled { iteration },
            source => AgentError::Transport { iteration, source },
        })
    }

    /// Resolve and execute one action.
    async fn dispatch(
        &self,
        action: &Action,
        iteration: usize,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let tool = match self.tools.lookup(&action.tool) {
            ToolLookup::Found(tool) => tool,
            ToolLookup::NotFound => {
                return Err(AgentError::ToolNotFound {
                    iteration,
                    tool: action.tool.clone(),
                })
            }
        };

        tracing::debug!(iteration, tool = %action.tool, "Calling tool with input: {}", truncate_for_log(&action.input, 500));

        let ctx = ToolContext {
            workspace: self.options.workspace.clone(),
            cancel: cancel.clone(),
            iteration,
        };

        let res = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AgentError::Cancelled { iteration }),
            res = tool.execute(&ctx, &action.input) => res,
        };

        match res {
            Ok(observation) => {
                tracing::debug!(iteration, tool = %action.tool, "Observation: {}", truncate_for_log(&observation, 1000));
                Ok(observation)
            }
            // A tool that stopped because the run was cancelled reports cancellation.
            Err(_) if cancel.is_cancelled() => Err(AgentError::Cancelled { iteration }),
            Err(source) => Err(AgentError::ToolExecution {
                iteration,
                tool: action.tool.clone(),
                source,
            }),
        }
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut cut = max_len;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... [truncated]", &s[..cut])
}
