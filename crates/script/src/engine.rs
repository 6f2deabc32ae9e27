//! Execution Engine
//!
//! The host-facing boundary of the sandbox. Validates action code, runs it
//! against exactly one knowledge-store capability under a wall-clock
//! timeout, and converts every failure into an `ExecutionOutcome`. The
//! denylist is a best-effort prefilter; the closed evaluator environment
//! is the boundary that actually holds.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use lorekeeper_core::ExecutionOutcome;
use lorekeeper_store::KnowledgeStore;
use regex::Regex;

use crate::error::{ScriptError, ScriptResult};
use crate::interp::Interp;
use crate::parser::parse;

/// One denylist rule with its pre-compiled pattern.
struct DenyRule {
    name: &'static str,
    regex: Regex,
}

/// Get compiled denylist rules (initialized once).
fn deny_rules() -> &'static Vec<DenyRule> {
    static RULES: OnceLock<Vec<DenyRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            ("dynamic evaluation", r"\beval\s*\("),
            ("function constructor", r"\bFunction\s*\("),
            ("module import", r"\b(?:require|import|module)\b"),
            ("process access", r"\b(?:process|child_process|spawn|execSync)\b"),
            ("filesystem primitive", r"\b(?:fs|readFileSync|writeFileSync)\s*[.(]"),
            ("network primitive", r"\b(?:fetch|XMLHttpRequest|WebSocket|net|http)\s*[.(]"),
            ("global object access", r"\b(?:globalThis|__proto__|prototype)\b"),
        ]
        .into_iter()
        .filter_map(|(name, pattern)| {
            Regex::new(pattern).ok().map(|regex| DenyRule { name, regex })
        })
        .collect()
    })
}

/// Engine limits and timeouts.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Wall-clock budget per action snippet
    pub timeout: Duration,
    /// Maximum accepted code length in bytes
    pub max_code_len: usize,
    /// Evaluator step budget, bounding work between await points
    pub max_steps: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_code_len: 32 * 1024,
            max_steps: 1_000_000,
        }
    }
}

/// Sandboxed executor for model-authored action code.
#[derive(Debug, Clone, Default)]
pub struct ScriptEngine {
    config: EngineConfig,
}

impl ScriptEngine {
    /// Create an engine with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with explicit limits.
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Pre-execution validation: size limits plus the pattern denylist.
    fn validate(&self, code: &str) -> ScriptResult<()> {
        if code.trim().is_empty() {
            return Err(ScriptError::validation("action code is empty"));
        }
        if code.len() > self.config.max_code_len {
            return Err(ScriptError::validation(format!(
                "action code is {} bytes, limit is {}",
                code.len(),
                self.config.max_code_len
            )));
        }
        for rule in deny_rules() {
            if rule.regex.is_match(code) {
                return Err(ScriptError::security(format!(
                    "action code rejected: {} is not allowed in the sandbox",
                    rule.name
                )));
            }
        }
        Ok(())
    }

    /// Execute one action snippet against one capability instance.
    ///
    /// Never panics and never returns an error: every failure mode,
    /// including capability errors and timeouts, becomes a failed outcome
    /// with a sanitized message. A timed-out script may have left partial
    /// writes behind; recovery is the model's job on the next turn.
    pub async fn execute(&self, code: &str, store: Arc<KnowledgeStore>) -> ExecutionOutcome {
        let started = Instant::now();

        if let Err(e) = self.validate(code) {
            return ExecutionOutcome::err(e.to_string(), started.elapsed());
        }

        let program = match parse(code) {
            Ok(program) => program,
            Err(e) => return ExecutionOutcome::err(e.to_string(), started.elapsed()),
        };

        let mut interp = Interp::new(store, self.config.max_steps);
        match tokio::time::timeout(self.config.timeout, interp.run(&program)).await {
            Ok(Ok(value)) => ExecutionOutcome::ok(value.to_json_string(), started.elapsed()),
            Ok(Err(e)) => ExecutionOutcome::err(e.to_string(), started.elapsed()),
            Err(_) => ExecutionOutcome::err(
                ScriptError::timeout(format!(
                    "wall-clock budget of {:?} exceeded; the workspace may hold partial writes",
                    self.config.timeout
                ))
                .to_string(),
                started.elapsed(),
            ),
        }
    }
}
