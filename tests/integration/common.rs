//! Shared test doubles and fixtures.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use lorekeeper::{Agent, AgentConfig, FileSessionStore};
use lorekeeper_core::{
    ConversationMessage, ModelConfig, ModelProvider, ProviderError, SinkError, StreamChunk,
    StreamSink,
};
use lorekeeper_store::TenantWorkspaces;

/// Provider double that pops scripted responses in order and counts calls.
pub struct ScriptedProvider {
    responses: Mutex<Vec<String>>,
    pub calls: Mutex<usize>,
}

impl ScriptedProvider {
    pub fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().rev().map(|s| s.to_string()).collect()),
            calls: Mutex::new(0),
        })
    }

    /// Provider that returns the same response for every turn.
    pub fn repeating(response: &str, times: usize) -> Arc<Self> {
        Self::new(&vec![response; times])
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn query(
        &self,
        _history: &[ConversationMessage],
        _config: &ModelConfig,
    ) -> Result<String, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        self.responses
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| ProviderError::transport("no scripted response left"))
    }
}

/// Sink double collecting streamed reasoning chunks.
#[derive(Default)]
pub struct CollectingSink {
    pub chunks: Mutex<Vec<String>>,
}

#[async_trait]
impl StreamSink for CollectingSink {
    async fn stream_chunk(&self, chunk: StreamChunk) -> Result<(), SinkError> {
        let StreamChunk::Text { text } = chunk;
        self.chunks.lock().unwrap().push(text);
        Ok(())
    }
}

/// Sink double that always fails delivery.
pub struct FailingSink;

#[async_trait]
impl StreamSink for FailingSink {
    async fn stream_chunk(&self, _chunk: StreamChunk) -> Result<(), SinkError> {
        Err(SinkError("connection closed".to_string()))
    }
}

/// Build an agent over a fresh temp workspace root.
pub fn agent_fixture(
    provider: Arc<dyn ModelProvider>,
    config: AgentConfig,
) -> (tempfile::TempDir, Agent) {
    let dir = tempfile::tempdir().unwrap();
    let workspaces = TenantWorkspaces::new(dir.path()).unwrap();
    let agent = Agent::new(
        provider,
        Arc::new(FileSessionStore::new()),
        workspaces,
        config,
    );
    (dir, agent)
}
