//! Model Transport Seam
//!
//! The agent loop obtains completions through this trait. Implementations
//! live outside the core workspace (HTTP clients, local runtimes, test
//! doubles) and are responsible for their own retry policy: an error
//! surfaced here is final and fatal to the current turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::message::ConversationMessage;
use thiserror::Error;

/// Model selection and generation parameters, passed through to the
/// transport untouched. Loading and validation happen outside the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier understood by the transport
    pub model: String,
    /// Optional sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Optional completion token cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "default".to_string(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Final failure from the model transport, after its own retries.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The transport could not produce a completion.
    #[error("Model transport error: {0}")]
    Transport(String),
}

impl ProviderError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

/// Black-box completion function over a conversation history.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Produce the next raw model output for the given history.
    ///
    /// Transient failures are retried inside the implementation; an `Err`
    /// here is terminal for the turn and propagates out of the agent loop.
    async fn query(
        &self,
        history: &[ConversationMessage],
        config: &ModelConfig,
    ) -> Result<String, ProviderError>;
}
