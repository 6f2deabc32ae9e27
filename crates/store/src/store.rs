//! Knowledge Store
//!
//! The capability object handed to sandboxed action code. One instance is
//! bound to one workspace root; every method that accepts a path resolves
//! and containment-checks it first and fails closed. Version-control
//! mutations are serialized per instance so concurrent actions cannot
//! interleave working-tree operations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::git::{CommitEntry, GitCli, WorkTreeStatus};
use crate::graph::{self, GraphMatch};
use crate::paths::resolve_in_workspace;
use crate::tokens::{estimate_tokens, DirectoryTokenStats};
use crate::walker::DocWalker;

/// One entry of a non-recursive directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
}

/// Tenant-scoped view of one version-controlled document tree.
pub struct KnowledgeStore {
    root: PathBuf,
    git: GitCli,
    /// Serializes version-control mutations within this workspace.
    vcs_lock: Mutex<()>,
}

impl KnowledgeStore {
    /// Open a store over the given workspace root, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            git: GitCli::new(),
            vcs_lock: Mutex::new(()),
        })
    }

    /// The workspace root bounding all path resolution.
    pub fn workspace_root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, rel: &str) -> StoreResult<PathBuf> {
        resolve_in_workspace(&self.root, rel)
    }

    /// Render an absolute path workspace-relative with forward slashes.
    fn rel_display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    // -----------------------------------------------------------------------
    // File operations
    // -----------------------------------------------------------------------

    /// Read a document's content.
    pub async fn read_file(&self, path: &str) -> StoreResult<String> {
        let resolved = self.resolve(path)?;
        match fs::read_to_string(&resolved).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::not_found(format!("file not found: {path}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write a document, creating parent directories as needed.
    pub async fn write_file(&self, path: &str, content: &str) -> StoreResult<()> {
        let resolved = self.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&resolved, content).await?;
        Ok(())
    }

    /// Compare-and-swap update: succeeds only when the on-disk content
    /// equals `expected`; otherwise nothing is mutated.
    pub async fn update_file(
        &self,
        path: &str,
        expected: &str,
        new_content: &str,
    ) -> StoreResult<()> {
        let resolved = self.resolve(path)?;
        let current = match fs::read_to_string(&resolved).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::not_found(format!("file not found: {path}")))
            }
            Err(e) => return Err(e.into()),
        };

        if current != expected {
            return Err(StoreError::stale_content(format!(
                "content of {path} does not match the expected previous content"
            )));
        }

        fs::write(&resolved, new_content).await?;
        Ok(())
    }

    /// Delete a document. Directories are rejected.
    pub async fn delete_file(&self, path: &str) -> StoreResult<()> {
        let resolved = self.resolve(path)?;
        let meta = match fs::metadata(&resolved).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::not_found(format!("file not found: {path}")))
            }
            Err(e) => return Err(e.into()),
        };
        if meta.is_dir() {
            return Err(StoreError::validation(format!(
                "{path} is a directory; deleteFile only removes files"
            )));
        }
        fs::remove_file(&resolved).await?;
        Ok(())
    }

    /// Rename/move a document, creating destination parents as needed.
    pub async fn rename_file(&self, from: &str, to: &str) -> StoreResult<()> {
        let source = self.resolve(from)?;
        let dest = self.resolve(to)?;
        if fs::metadata(&source).await.is_err() {
            return Err(StoreError::not_found(format!("file not found: {from}")));
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(&source, &dest).await?;
        Ok(())
    }

    /// Whether a path exists inside the workspace. Never raises: any
    /// resolution or I/O failure is reported as `false`.
    pub async fn exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(resolved) => fs::metadata(&resolved).await.is_ok(),
            Err(_) => false,
        }
    }

    /// Create a directory (and parents). Idempotent.
    pub async fn create_directory(&self, path: &str) -> StoreResult<()> {
        let resolved = self.resolve(path)?;
        fs::create_dir_all(&resolved).await?;
        Ok(())
    }

    /// Non-recursive listing of one directory, sorted by name.
    pub async fn list_entries(&self, path: &str) -> StoreResult<Vec<DirEntryInfo>> {
        let resolved = self.resolve(path)?;
        let mut reader = match fs::read_dir(&resolved).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::not_found(format!(
                    "directory not found: {path}"
                )))
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    // -----------------------------------------------------------------------
    // Version control
    // -----------------------------------------------------------------------

    /// Stage everything and create a commit. Returns the commit hash, or
    /// [`crate::git::COMMIT_NO_CHANGES`] when the tree is clean. Nothing
    /// else in the store commits as a side effect.
    pub async fn commit(&self, message: &str) -> StoreResult<String> {
        let _guard = self.vcs_lock.lock().await;
        self.git.ensure_repo(&self.root).await?;
        self.git.commit_all(&self.root, message).await
    }

    /// Diff one path: working-tree-vs-HEAD without refs, or between refs.
    pub async fn diff(
        &self,
        path: &str,
        from: Option<&str>,
        to: Option<&str>,
    ) -> StoreResult<String> {
        self.resolve(path)?;
        let _guard = self.vcs_lock.lock().await;
        self.git.ensure_repo(&self.root).await?;
        self.git.diff(&self.root, path, from, to).await
    }

    /// Commit history, most-recent-first, optionally limited to a path.
    pub async fn log(
        &self,
        path: Option<&str>,
        max_entries: usize,
    ) -> StoreResult<Vec<CommitEntry>> {
        if let Some(path) = path {
            self.resolve(path)?;
        }
        let _guard = self.vcs_lock.lock().await;
        self.git.ensure_repo(&self.root).await?;
        self.git.log(&self.root, path, max_entries).await
    }

    /// Working-tree status summary.
    pub async fn staged_or_changed_files(&self) -> StoreResult<WorkTreeStatus> {
        let _guard = self.vcs_lock.lock().await;
        self.git.ensure_repo(&self.root).await?;
        self.git.status(&self.root).await
    }

    /// Shelve the current uncommitted state onto the checkpoint stack.
    pub async fn save_checkpoint(&self) -> StoreResult<()> {
        let _guard = self.vcs_lock.lock().await;
        self.git.ensure_repo(&self.root).await?;
        self.git.stash_push(&self.root).await
    }

    /// Pop and apply the most recent checkpoint. Returns `false`, without
    /// error, when no checkpoint exists.
    pub async fn revert_to_last_checkpoint(&self) -> StoreResult<bool> {
        let _guard = self.vcs_lock.lock().await;
        self.git.ensure_repo(&self.root).await?;
        self.git.stash_pop(&self.root).await
    }

    /// Reset the working tree to the last commit and remove untracked
    /// files. Returns `false` only when the underlying call fails.
    pub async fn discard_changes(&self) -> bool {
        let _guard = self.vcs_lock.lock().await;
        if let Err(e) = self.git.ensure_repo(&self.root).await {
            tracing::warn!(error = %e, "discard_changes: repository unavailable");
            return false;
        }
        match self.git.reset_hard_clean(&self.root).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "discard_changes failed");
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Graph operations
    // -----------------------------------------------------------------------

    /// Evaluate a conjunctive graph query against every document.
    ///
    /// Unrecognized query syntax yields an empty result set, never an
    /// error; results always reflect current on-disk state.
    pub async fn query_graph(&self, query: &str) -> StoreResult<Vec<GraphMatch>> {
        let mut results = Vec::new();
        for doc in DocWalker::new(&self.root) {
            let Ok(content) = fs::read_to_string(&doc).await else {
                continue;
            };
            if let Some(matches) = graph::match_document(query, &content) {
                results.push(GraphMatch {
                    path: self.rel_display(&doc),
                    matches,
                });
            }
        }
        Ok(results)
    }

    /// Deduplicated, insertion-ordered wikilink targets of one document.
    pub async fn outgoing_links(&self, path: &str) -> StoreResult<Vec<String>> {
        let content = self.read_file(path).await?;
        Ok(graph::extract_links(&content))
    }

    /// Every document whose outgoing links include this document's base
    /// name (case-insensitive), excluding the document itself.
    pub async fn backlinks(&self, path: &str) -> StoreResult<Vec<String>> {
        let target = self.resolve(path)?;
        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if stem.is_empty() {
            return Err(StoreError::validation(format!(
                "{path} has no base name to match links against"
            )));
        }

        let mut sources = Vec::new();
        for doc in DocWalker::new(&self.root) {
            if doc == target {
                continue;
            }
            let Ok(content) = fs::read_to_string(&doc).await else {
                continue;
            };
            let links_here = graph::extract_links(&content)
                .iter()
                .any(|link| link.to_lowercase() == stem);
            if links_here {
                sources.push(self.rel_display(&doc));
            }
        }
        Ok(sources)
    }

    /// Every document whose content contains the query, case-insensitive.
    /// An empty query matches broadly; the scan never raises.
    pub async fn search_global(&self, query: &str) -> StoreResult<Vec<String>> {
        let needle = query.to_lowercase();
        let mut hits = Vec::new();
        for doc in DocWalker::new(&self.root) {
            let Ok(content) = fs::read_to_string(&doc).await else {
                continue;
            };
            if content.to_lowercase().contains(&needle) {
                hits.push(self.rel_display(&doc));
            }
        }
        Ok(hits)
    }

    // -----------------------------------------------------------------------
    // Token estimation
    // -----------------------------------------------------------------------

    /// Estimated token count of one document.
    pub async fn file_tokens(&self, path: &str) -> StoreResult<usize> {
        let content = self.read_file(path).await?;
        Ok(estimate_tokens(&content))
    }

    /// Aggregate token statistics for a directory subtree.
    pub async fn directory_token_stats(&self, path: &str) -> StoreResult<DirectoryTokenStats> {
        let resolved = self.resolve(path)?;
        if fs::metadata(&resolved).await.is_err() {
            return Err(StoreError::not_found(format!(
                "directory not found: {path}"
            )));
        }

        let mut stats = DirectoryTokenStats::default();
        for doc in DocWalker::new(&resolved) {
            let Ok(content) = fs::read_to_string(&doc).await else {
                continue;
            };
            stats.record(self.rel_display(&doc), estimate_tokens(&content));
        }
        Ok(stats)
    }
}
