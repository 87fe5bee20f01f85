//! Agent module - the ReAct loop and its collaborators.
//!
//! Each run follows the Reason + Act pattern:
//! 1. Render the instruction template with the tool catalog and question
//! 2. Ask the model to continue the transcript
//! 3. Parse the reply for `Action:`/`Action Input:` or `Final Answer:`
//! 4. Dispatch the named tool and append its `Observation:`, or finish
//! 5. Re-render with the grown transcript and repeat, up to the iteration ceiling

mod agent_loop;
mod error;
pub mod parser;
mod prompt;
mod state;

pub use agent_loop::{Agent, AgentOptions, AgentStep, RunOutput};
pub use error::AgentError;
pub use parser::{parse, Action, Parsed};
pub use prompt::{PromptBuilder, PromptTemplate, TemplateError, DEFAULT_TEMPLATE};
pub use state::{format_observation, AgentState, NextStep};
