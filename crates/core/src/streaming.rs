//! Reasoning Stream Seam
//!
//! The agent loop forwards reasoning text to an injected sink as it is
//! parsed. Sink failures are swallowed by the loop; streaming is advisory
//! and never affects turn outcomes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One streamed chunk. Only reasoning text is streamed today; the tagged
/// representation leaves room for more chunk kinds without breaking sinks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamChunk {
    /// Reasoning text delta
    Text { text: String },
}

impl StreamChunk {
    /// Create a text chunk
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Failure while delivering a chunk. The loop logs and continues.
#[derive(Error, Debug)]
#[error("Stream sink error: {0}")]
pub struct SinkError(pub String);

/// Receiver of reasoning chunks, injected into the agent loop.
#[async_trait]
pub trait StreamSink: Send + Sync {
    /// Deliver one chunk. May suspend.
    async fn stream_chunk(&self, chunk: StreamChunk) -> Result<(), SinkError>;
}
