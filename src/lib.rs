//! # React Agent
//!
//! A Reason + Act agent loop over a text-generation model.
//!
//! This library provides:
//! - The agent loop: prompt rendering, directive parsing, tool dispatch
//! - A name-keyed tool registry and a handful of built-in tools
//! - An OpenAI-compatible generation client (OpenRouter by default)
//! - An HTTP API for submitting questions
//!
//! ## Architecture
//!
//! The model is asked to answer in a fixed textual protocol:
//!
//! ```text
//! Thought: ...
//! Action: <tool name>
//! Action Input: <tool input>
//! Observation: <filled in by the agent>
//! ...
//! Final Answer: <answer>
//! ```
//!
//! The agent parses each reply, dispatches the requested tool, appends the
//! observation to the transcript and asks again until a final answer arrives.
//!
//! ## Example
//!
//! ```rust,ignore
//! use react_agent::{agent::Agent, config::Config};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = Config::from_env()?;
//! let agent = Agent::from_config(&config)?;
//! let result = agent.run("What is 17 * 23?", &CancellationToken::new()).await?;
//! println!("{}", result.output);
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod tools;

pub use config::Config;
