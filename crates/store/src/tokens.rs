//! Token Estimation
//!
//! Deterministic approximation of model-token counts from character
//! length, used for budgeting only; no tokenizer parity is attempted.

use serde::{Deserialize, Serialize};

/// Fixed characters-per-token ratio.
const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of a piece of text, rounding up.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(CHARS_PER_TOKEN)
}

/// Aggregate token statistics for a directory of documents.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DirectoryTokenStats {
    /// Total estimated tokens across all documents
    pub total_tokens: usize,
    /// Number of documents scanned
    pub file_count: usize,
    /// Workspace-relative path of the largest document, with its tokens
    pub largest_file: Option<(String, usize)>,
    /// Average tokens per document, zero when the directory is empty
    pub average_tokens: usize,
}

impl DirectoryTokenStats {
    /// Fold one document into the aggregate.
    pub fn record(&mut self, path: String, tokens: usize) {
        self.total_tokens += tokens;
        self.file_count += 1;
        match &self.largest_file {
            Some((_, largest)) if *largest >= tokens => {}
            _ => self.largest_file = Some((path, tokens)),
        }
        self.average_tokens = self.total_tokens / self.file_count;
    }
}
