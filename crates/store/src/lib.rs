//! Lorekeeper Store
//!
//! The knowledge store: a tenant-isolated, path-contained view of one
//! version-controlled directory of interlinked documents. This crate is
//! the complete capability surface handed to sandboxed action code; its
//! containment guarantees are what make delegating code execution to a
//! model safe at all.
//!
//! ## Module Organization
//!
//! - `error` - Store error taxonomy (`StoreError`, `StoreResult`)
//! - `paths` - Path containment and tenant workspace resolution
//! - `git` - Git CLI wrapper (`GitCli`), commit/status/stash primitives
//! - `walker` - Lazy depth-first document traversal
//! - `graph` - Property/wikilink extraction and the graph query surface
//! - `tokens` - Deterministic token estimation
//! - `store` - The `KnowledgeStore` facade binding it all to one workspace

pub mod error;
pub mod git;
pub mod graph;
pub mod paths;
pub mod store;
pub mod tokens;
pub mod walker;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{StoreError, StoreResult};

// ── Path Security ──────────────────────────────────────────────────────
pub use paths::{resolve_in_workspace, sanitize_tenant_id, TenantWorkspaces};

// ── Version Control ────────────────────────────────────────────────────
pub use git::{CommitEntry, GitCli, WorkTreeStatus, COMMIT_NO_CHANGES};

// ── Graph Types ────────────────────────────────────────────────────────
pub use graph::GraphMatch;

// ── Token Estimation ───────────────────────────────────────────────────
pub use tokens::{estimate_tokens, DirectoryTokenStats};

// ── The Store ──────────────────────────────────────────────────────────
pub use store::{DirEntryInfo, KnowledgeStore};
