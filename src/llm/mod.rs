//! Model access: the text-in/text-out contract the agent loop drives.

mod openrouter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use openrouter::{OpenRouterClient, DEFAULT_BASE_URL};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Failed to decode model response: {0}")]
    Decode(String),

    #[error("Generation cancelled")]
    Cancelled,
}

/// Executes a rendered prompt against a model and returns the raw reply.
#[async_trait]
pub trait GenerationPipeline: Send + Sync {
    /// Generate a completion for `prompt`. Implementations must stop promptly
    /// once `cancel` fires.
    async fn generate(&self, prompt: &str, cancel: &CancellationToken) -> Result<String, LlmError>;
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A chat message in OpenAI-compatible wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
        }
    }
}
