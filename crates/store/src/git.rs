//! Git Operations
//!
//! Safe wrapper around git CLI operations for workspace version control.
//! Each tenant workspace is its own repository, provisioned lazily on the
//! first version-control call.

use std::path::Path;

use tokio::process::Command;

use crate::error::{StoreError, StoreResult};

/// Sentinel returned by `commit` when the working tree has no changes.
pub const COMMIT_NO_CHANGES: &str = "no-changes";

/// Result of a git command execution
#[derive(Debug)]
pub struct GitResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl GitResult {
    /// Check if the command was successful and return stdout or error
    pub fn into_result(self) -> StoreResult<String> {
        if self.success {
            Ok(self.stdout)
        } else {
            Err(StoreError::command(format!(
                "Git command failed (exit {}): {}",
                self.exit_code,
                self.stderr.trim()
            )))
        }
    }
}

/// One commit record, most-recent-first in log output.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommitEntry {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub date: String,
}

/// Working-tree status summary.
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct WorkTreeStatus {
    pub staged: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
    pub renamed: Vec<String>,
    pub untracked: Vec<String>,
    pub conflicted: Vec<String>,
}

impl WorkTreeStatus {
    /// Check if the working tree is clean
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.modified.is_empty()
            && self.deleted.is_empty()
            && self.renamed.is_empty()
            && self.untracked.is_empty()
            && self.conflicted.is_empty()
    }

    /// Get total number of changes
    pub fn change_count(&self) -> usize {
        self.staged.len()
            + self.modified.len()
            + self.deleted.len()
            + self.renamed.len()
            + self.untracked.len()
            + self.conflicted.len()
    }
}

/// Safe git operations wrapper
#[derive(Debug, Default, Clone)]
pub struct GitCli;

impl GitCli {
    /// Create a new GitCli instance
    pub fn new() -> Self {
        Self
    }

    /// Execute a git command in the specified directory
    pub async fn execute(&self, cwd: &Path, args: &[&str]) -> StoreResult<GitResult> {
        let output = Command::new("git")
            .args(args)
            .current_dir(cwd)
            // Disable interactive prompts to avoid hanging automation flows/tests.
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .map_err(|e| StoreError::command(format!("Failed to execute git: {e}")))?;

        Ok(GitResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    /// Provision a repository in the workspace if one is not there yet.
    ///
    /// Sets a local identity and creates an empty baseline commit so that
    /// diff/stash have a HEAD to work against from the first turn.
    pub async fn ensure_repo(&self, cwd: &Path) -> StoreResult<()> {
        if cwd.join(".git").exists() {
            return Ok(());
        }
        self.execute(cwd, &["init", "--quiet"]).await?.into_result()?;
        // Session records live beside the documents but are not part of
        // the knowledge base; exclude them repo-locally so commit -A,
        // stash and clean never touch them.
        let exclude = cwd.join(".git").join("info").join("exclude");
        if let Some(parent) = exclude.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&exclude, ".sessions/\n").await?;
        self.execute(cwd, &["config", "user.name", "lorekeeper"])
            .await?
            .into_result()?;
        self.execute(cwd, &["config", "user.email", "agent@lorekeeper.local"])
            .await?
            .into_result()?;
        self.execute(
            cwd,
            &[
                "commit",
                "--quiet",
                "--allow-empty",
                "-m",
                "workspace initialized",
            ],
        )
        .await?
        .into_result()?;
        Ok(())
    }

    /// Stage everything and commit. Returns the new commit hash, or the
    /// [`COMMIT_NO_CHANGES`] sentinel when the tree is clean.
    pub async fn commit_all(&self, cwd: &Path, message: &str) -> StoreResult<String> {
        self.execute(cwd, &["add", "-A"]).await?.into_result()?;

        let status = self
            .execute(cwd, &["status", "--porcelain"])
            .await?
            .into_result()?;
        if status.trim().is_empty() {
            return Ok(COMMIT_NO_CHANGES.to_string());
        }

        let result = self.execute(cwd, &["commit", "-m", message]).await?;
        if result.success {
            let sha = self
                .execute(cwd, &["rev-parse", "HEAD"])
                .await?
                .into_result()?
                .trim()
                .to_string();
            Ok(sha)
        } else {
            Err(StoreError::command(format!(
                "Commit failed: {}",
                result.stderr.trim()
            )))
        }
    }

    /// Diff one path: working-tree-vs-HEAD by default, or between two refs.
    pub async fn diff(
        &self,
        cwd: &Path,
        path: &str,
        from: Option<&str>,
        to: Option<&str>,
    ) -> StoreResult<String> {
        let output = match (from, to) {
            (Some(from), Some(to)) => {
                self.execute(cwd, &["diff", from, to, "--", path]).await?
            }
            (Some(from), None) => self.execute(cwd, &["diff", from, "--", path]).await?,
            _ => self.execute(cwd, &["diff", "HEAD", "--", path]).await?,
        };
        output.into_result()
    }

    /// Get commit history, most-recent-first, optionally limited to a path.
    pub async fn log(
        &self,
        cwd: &Path,
        path: Option<&str>,
        max_entries: usize,
    ) -> StoreResult<Vec<CommitEntry>> {
        let count = format!("-{max_entries}");
        let mut args = vec!["log", &count, "--format=%H|%s|%an|%aI"];
        if let Some(path) = path {
            args.push("--");
            args.push(path);
        }

        let output = self.execute(cwd, &args).await?.into_result()?;
        let entries = output
            .lines()
            .filter_map(|line| {
                let parts: Vec<&str> = line.splitn(4, '|').collect();
                if parts.len() >= 4 {
                    Some(CommitEntry {
                        hash: parts[0].to_string(),
                        message: parts[1].to_string(),
                        author: parts[2].to_string(),
                        date: parts[3].to_string(),
                    })
                } else {
                    None
                }
            })
            .collect();

        Ok(entries)
    }

    /// Get status of the working directory
    pub async fn status(&self, cwd: &Path) -> StoreResult<WorkTreeStatus> {
        let output = self
            .execute(cwd, &["status", "--porcelain"])
            .await?
            .into_result()?;

        let mut status = WorkTreeStatus::default();

        for line in output.lines() {
            if line.len() < 3 {
                continue;
            }

            let index_status = line.chars().next().unwrap_or(' ');
            let work_status = line.chars().nth(1).unwrap_or(' ');
            let file = line[3..].to_string();

            match (index_status, work_status) {
                ('?', '?') => status.untracked.push(file),
                ('A', _) => status.staged.push(file),
                ('M', _) | (_, 'M') => {
                    if index_status != ' ' {
                        status.staged.push(file.clone());
                    }
                    if work_status != ' ' {
                        status.modified.push(file);
                    }
                }
                ('D', _) | (_, 'D') => status.deleted.push(file),
                ('R', _) => status.renamed.push(file),
                ('U', _) | (_, 'U') => status.conflicted.push(file),
                _ => {}
            }
        }

        Ok(status)
    }

    /// Shelve the current uncommitted state, including untracked files.
    ///
    /// Pushing a clean tree is a no-op for git; the stash stack is
    /// unchanged and the later pop sees whatever was there before.
    pub async fn stash_push(&self, cwd: &Path) -> StoreResult<()> {
        self.execute(cwd, &["stash", "push", "--include-untracked", "--quiet"])
            .await?
            .into_result()?;
        Ok(())
    }

    /// Un-shelve the most recent stash entry.
    ///
    /// Returns `false`, without error, when the stack is empty.
    pub async fn stash_pop(&self, cwd: &Path) -> StoreResult<bool> {
        let list = self
            .execute(cwd, &["stash", "list"])
            .await?
            .into_result()?;
        if list.trim().is_empty() {
            return Ok(false);
        }
        self.execute(cwd, &["stash", "pop", "--quiet"])
            .await?
            .into_result()?;
        Ok(true)
    }

    /// Number of entries on the stash stack.
    pub async fn stash_depth(&self, cwd: &Path) -> StoreResult<usize> {
        let list = self
            .execute(cwd, &["stash", "list"])
            .await?
            .into_result()?;
        Ok(list.lines().filter(|l| !l.trim().is_empty()).count())
    }

    /// Reset the working tree to the last commit and remove untracked files.
    pub async fn reset_hard_clean(&self, cwd: &Path) -> StoreResult<()> {
        self.execute(cwd, &["reset", "--quiet", "--hard", "HEAD"])
            .await?
            .into_result()?;
        self.execute(cwd, &["clean", "-fdq"]).await?.into_result()?;
        Ok(())
    }
}
