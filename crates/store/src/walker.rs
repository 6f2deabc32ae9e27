//! Document Walker
//!
//! Lazy depth-first traversal over the documents of one workspace. Graph
//! and search operations hold no cached index; every call re-walks the
//! current on-disk state, so results always reflect what is on disk now.

use std::fs;
use std::path::{Path, PathBuf};

/// Directory names excluded from traversal.
const SKIPPED_DIRS: &[&str] = &[".git", ".sessions"];

/// Depth-first iterator over document paths under a root.
///
/// Finite and not restartable mid-traversal; cheap to re-create per call.
/// Unreadable directories are skipped rather than surfaced, matching the
/// scan-never-raises contract of the operations built on top.
pub struct DocWalker {
    stack: Vec<PathBuf>,
}

impl DocWalker {
    /// Create a walker rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            stack: vec![root.into()],
        }
    }

    fn is_skipped(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| SKIPPED_DIRS.contains(&name))
            .unwrap_or(false)
    }
}

impl Iterator for DocWalker {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        while let Some(current) = self.stack.pop() {
            if current.is_dir() {
                if Self::is_skipped(&current) {
                    continue;
                }
                let Ok(entries) = fs::read_dir(&current) else {
                    continue;
                };
                // Collect then reverse-push so traversal order is stable.
                let mut children: Vec<PathBuf> =
                    entries.flatten().map(|e| e.path()).collect();
                children.sort();
                for child in children.into_iter().rev() {
                    self.stack.push(child);
                }
            } else if current.is_file() {
                return Some(current);
            }
        }
        None
    }
}
