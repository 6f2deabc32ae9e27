//! Lorekeeper
//!
//! An autonomous agent that maintains a persistent, version-controlled
//! knowledge base by turning natural-language requests into small scripts
//! it generates and then executes itself, inside a sandbox whose only
//! capability is a tenant-scoped knowledge store.
//!
//! The workspace splits into three member crates plus this orchestration
//! layer:
//!
//! - [`lorekeeper_core`] - conversation model, error taxonomy, and the
//!   traits external collaborators implement
//! - [`lorekeeper_store`] - the knowledge store: path-contained file
//!   operations, git-backed version control and checkpoints, graph
//!   queries, token estimation
//! - [`lorekeeper_script`] - the sandboxed execution engine for
//!   model-authored action code
//! - this crate - the agent turn loop, response parser, session store,
//!   and configuration
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use lorekeeper::{Agent, AgentConfig, FileSessionStore};
//! use lorekeeper_store::TenantWorkspaces;
//!
//! # async fn run(provider: Arc<dyn lorekeeper_core::ModelProvider>) -> Result<(), Box<dyn std::error::Error>> {
//! let workspaces = TenantWorkspaces::new("/var/lib/lorekeeper")?;
//! let agent = Agent::new(
//!     provider,
//!     Arc::new(FileSessionStore::new()),
//!     workspaces,
//!     AgentConfig::default(),
//! );
//! let reply = agent
//!     .handle("create a note about standups", Some("acme"), "session-1")
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod parser;
pub mod session;

// ── The Agent ──────────────────────────────────────────────────────────
pub use agent::{Agent, AgentError, AgentResult, NO_ANSWER_REPLY, PARSE_FAILURE_REPLY};

// ── Configuration ──────────────────────────────────────────────────────
pub use config::AgentConfig;

// ── Response Parsing ───────────────────────────────────────────────────
pub use parser::parse_response;

// ── Sessions ───────────────────────────────────────────────────────────
pub use session::{FileSessionStore, SessionStore};
