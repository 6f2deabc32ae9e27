//! Agent Loop
//!
//! The orchestrator wiring the model transport, the response parser, the
//! sandbox engine, and the per-tenant knowledge store into the turn loop:
//! query the model, parse, stream reasoning, execute action code, feed
//! the outcome back as the next turn's input, persist, and stop on a
//! reply or when the turn budget runs out.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use lorekeeper_core::{
    ConversationMessage, CoreError, ModelProvider, ProviderError, StreamChunk, StreamSink,
};
use lorekeeper_script::ScriptEngine;
use lorekeeper_store::{KnowledgeStore, StoreError, TenantWorkspaces};

use crate::config::AgentConfig;
use crate::parser::parse_response;
use crate::session::SessionStore;

/// Fixed reply when a model response contains none of the recognized markers.
pub const PARSE_FAILURE_REPLY: &str =
    "I could not interpret the model's response for this request. Please try again.";

/// Fixed reply when the turn budget runs out without a reply. An
/// incomplete outcome, not an error.
pub const NO_ANSWER_REPLY: &str =
    "No answer was produced within the allotted number of turns.";

/// Fatal failures of one `handle` call. Everything recoverable — security
/// violations, missing files, stale content, timeouts — is fed back to
/// the model instead of surfacing here.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Model transport gave up after its own retries
    #[error(transparent)]
    Transport(#[from] ProviderError),

    /// Malformed request input (empty query, unusable tenant id)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Workspace resolution or store infrastructure failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Session persistence failure
    #[error("Session store error: {0}")]
    Session(#[from] CoreError),
}

/// Result type alias for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

/// The Lorekeeper agent: one instance serves many tenants and sessions.
///
/// Turns within one (tenant, session) pair must run sequentially — each
/// turn depends on the history the previous one persisted. Different
/// sessions and tenants may call `handle` concurrently; the only state
/// crossing turns lives in the session store and the workspace.
pub struct Agent {
    provider: Arc<dyn ModelProvider>,
    sessions: Arc<dyn SessionStore>,
    sink: Option<Arc<dyn StreamSink>>,
    workspaces: TenantWorkspaces,
    engine: ScriptEngine,
    config: AgentConfig,
}

impl Agent {
    /// Create an agent over a global workspace root.
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        sessions: Arc<dyn SessionStore>,
        workspaces: TenantWorkspaces,
        config: AgentConfig,
    ) -> Self {
        let engine = ScriptEngine::with_config(config.engine_config());
        Self {
            provider,
            sessions,
            sink: None,
            workspaces,
            engine,
            config,
        }
    }

    /// Attach a streaming sink for reasoning text.
    pub fn with_stream_sink(mut self, sink: Arc<dyn StreamSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Handle one request: resolve the tenant workspace, replay the
    /// session, and run the turn loop until a reply or budget exhaustion.
    pub async fn handle(
        &self,
        query: &str,
        tenant: Option<&str>,
        session_id: &str,
    ) -> AgentResult<String> {
        if query.trim().is_empty() {
            return Err(AgentError::Validation("query is empty".to_string()));
        }
        if session_id.trim().is_empty() {
            return Err(AgentError::Validation("session id is empty".to_string()));
        }

        let request_id = uuid::Uuid::new_v4();
        let workspace = self.workspaces.resolve(tenant)?;
        let store = Arc::new(KnowledgeStore::new(&workspace)?);
        debug!(%request_id, session_id, workspace = %workspace.display(), "handling query");

        let mut history = match self.sessions.load(&workspace, session_id).await? {
            Some(history) => history,
            None => vec![ConversationMessage::system(build_system_prompt())],
        };
        history.push(ConversationMessage::user(query));

        for turn in 0..self.config.max_turns {
            let raw = self.provider.query(&history, &self.config.model).await?;
            let parsed = parse_response(&raw);

            if parsed.is_empty() {
                // No recognized fields at all: terminal for this request,
                // no retried model call.
                history.push(ConversationMessage::assistant(raw));
                self.sessions.save(&workspace, session_id, &history).await?;
                return Ok(PARSE_FAILURE_REPLY.to_string());
            }

            history.push(ConversationMessage::assistant(raw));

            if let Some(reasoning) = &parsed.reasoning {
                self.stream_reasoning(reasoning).await;
            }

            if let Some(action) = &parsed.action {
                let outcome = self.engine.execute(action, Arc::clone(&store)).await;
                debug!(
                    %request_id,
                    turn,
                    success = outcome.success,
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "action executed"
                );
                history.push(ConversationMessage::user(outcome.to_feedback()));
            }

            self.sessions.save(&workspace, session_id, &history).await?;

            // A reply is the terminal signal: the loop ends now instead of
            // feeding the action outcome back for another turn.
            if let Some(reply) = parsed.reply {
                return Ok(reply);
            }
        }

        Ok(NO_ANSWER_REPLY.to_string())
    }

    /// Forward reasoning to the sink; delivery failures never abort a turn.
    async fn stream_reasoning(&self, reasoning: &str) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = sink.stream_chunk(StreamChunk::text(reasoning)).await {
            warn!(error = %e, "reasoning stream failed; continuing turn");
        }
    }
}

/// System prompt seeded into every new session: the response protocol and
/// the complete capability surface of the sandbox.
fn build_system_prompt() -> String {
    [
        "You are Lorekeeper, an agent that maintains a version-controlled \
         knowledge base of interlinked text documents.",
        "",
        "Respond using these tags, each at most once:",
        "  <think>your reasoning (streamed to the user)</think>",
        "  <act>a short script to run against the knowledge base</act>",
        "  <reply>your final answer; this ends the conversation turn</reply>",
        "Emit <act> without <reply> to run code and see its result before \
         answering. The result (or error) arrives as the next user message.",
        "",
        "Action scripts use let/if/while/for-in/return, string, number, \
         bool, null, list, and map values, and these globals only:",
        "  mem.readFile(path), mem.writeFile(path, content), \
         mem.updateFile(path, expected, newContent), mem.deleteFile(path), \
         mem.renameFile(from, to), mem.exists(path), \
         mem.createDirectory(path), mem.listEntries(path)",
        "  mem.commit(message), mem.diff(path, from?, to?), \
         mem.log(path?, maxEntries?), mem.stagedOrChangedFiles()",
        "  mem.saveCheckpoint(), mem.revertToLastCheckpoint(), \
         mem.discardChanges()",
        "  mem.queryGraph(query), mem.getOutgoingLinks(path), \
         mem.getBacklinks(path), mem.searchGlobal(query)",
        "  mem.getWorkspaceRoot(), mem.estimateTokens(text), \
         mem.fileTokens(path), mem.directoryTokenStats(path)",
        "  console.log(...), json.parse(s), json.stringify(v), \
         re.test(p, s), re.find(p, s), re.findAll(p, s), now(), len(x), \
         str(x), num(x), trim(s), lower(s), upper(s), split(s, sep), \
         join(list, sep), contains(c, x), keys(m), push(list, x), \
         range(n)",
        "",
        "Documents may carry `key:: value` property lines and [[Target]] \
         wikilinks. Graph queries combine `key:: value`, `[[Target]]`, and \
         `link:substring` clauses with AND.",
        "Paths are relative to your workspace; commits happen only when \
         you call mem.commit.",
    ]
    .join("\n")
}
