//! Lorekeeper Core
//!
//! Foundational types for the Lorekeeper workspace: the error taxonomy,
//! the conversation model, the execution-outcome type shared with the
//! sandbox, and the traits implemented by external collaborators (model
//! transport, streaming sink).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `message` - Conversation messages (`ConversationMessage`, `MessageRole`)
//! - `outcome` - Action execution results (`ExecutionOutcome`, `ParsedResponse`)
//! - `provider` - Model transport seam (`ModelProvider`, `ModelConfig`, `ProviderError`)
//! - `streaming` - Reasoning stream seam (`StreamSink`, `StreamChunk`, `SinkError`)
//!
//! ## Design Principles
//!
//! 1. **Zero dependencies beyond serde/async-trait/thiserror** - keeps build times minimal
//! 2. **Trait-based seams** - the model transport and streaming sink are injected,
//!    never constructed here
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod error;
pub mod message;
pub mod outcome;
pub mod provider;
pub mod streaming;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Conversation Model ─────────────────────────────────────────────────
pub use message::{ConversationMessage, MessageRole};

// ── Execution Outcomes ─────────────────────────────────────────────────
pub use outcome::{ExecutionOutcome, ParsedResponse};

// ── Model Transport Seam ───────────────────────────────────────────────
pub use provider::{ModelConfig, ModelProvider, ProviderError};

// ── Streaming Seam ─────────────────────────────────────────────────────
pub use streaming::{SinkError, StreamChunk, StreamSink};
