//! Session Store
//!
//! Persists the ordered conversation history for each session id, scoped
//! to a tenant workspace. The store is an injectable trait so hosts can
//! swap the file-backed default for their own persistence; lifecycle is
//! create-on-first-miss, save-after-every-turn, no implicit eviction.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;

use lorekeeper_core::{ConversationMessage, CoreResult};
use lorekeeper_store::sanitize_tenant_id;

/// Directory under each workspace holding session records.
const SESSIONS_DIR: &str = ".sessions";

/// Durable conversation history keyed by (workspace, session id).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session's history. `None` (not an error) when absent.
    async fn load(
        &self,
        workspace: &Path,
        session_id: &str,
    ) -> CoreResult<Option<Vec<ConversationMessage>>>;

    /// Persist a session's full history.
    async fn save(
        &self,
        workspace: &Path,
        session_id: &str,
        messages: &[ConversationMessage],
    ) -> CoreResult<()>;
}

/// On-disk session record.
#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    id: String,
    updated_at: String,
    messages: Vec<ConversationMessage>,
}

/// Default store: one JSON document per session at
/// `<workspace>/.sessions/<id>.json`.
#[derive(Debug, Default, Clone)]
pub struct FileSessionStore;

impl FileSessionStore {
    /// Create a new file-backed session store.
    pub fn new() -> Self {
        Self
    }

    /// Session ids are untrusted input; reuse the tenant-segment
    /// sanitizer so an id can never escape the sessions directory.
    fn record_path(workspace: &Path, session_id: &str) -> PathBuf {
        let file = format!("{}.json", sanitize_tenant_id(session_id));
        workspace.join(SESSIONS_DIR).join(file)
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(
        &self,
        workspace: &Path,
        session_id: &str,
    ) -> CoreResult<Option<Vec<ConversationMessage>>> {
        let path = Self::record_path(workspace, session_id);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: SessionRecord = serde_json::from_str(&raw)?;
        Ok(Some(record.messages))
    }

    async fn save(
        &self,
        workspace: &Path,
        session_id: &str,
        messages: &[ConversationMessage],
    ) -> CoreResult<()> {
        let path = Self::record_path(workspace, session_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let record = SessionRecord {
            id: session_id.to_string(),
            updated_at: chrono::Utc::now().to_rfc3339(),
            messages: messages.to_vec(),
        };
        fs::write(&path, serde_json::to_string_pretty(&record)?).await?;
        Ok(())
    }
}
