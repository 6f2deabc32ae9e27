//! Agent Configuration
//!
//! Plain serde structs with defaults; loading and validating these from a
//! file or environment is the host's concern.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use lorekeeper_core::ModelConfig;
use lorekeeper_script::EngineConfig;

fn default_max_turns() -> usize {
    10
}

fn default_action_timeout_ms() -> u64 {
    5_000
}

fn default_max_action_code_len() -> usize {
    32 * 1024
}

/// Configuration for one agent instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model turns per request before giving up
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Wall-clock budget per action snippet, milliseconds
    #[serde(default = "default_action_timeout_ms")]
    pub action_timeout_ms: u64,
    /// Maximum accepted action code length, bytes
    #[serde(default = "default_max_action_code_len")]
    pub max_action_code_len: usize,
    /// Model selection and generation parameters
    #[serde(default)]
    pub model: ModelConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            action_timeout_ms: default_action_timeout_ms(),
            max_action_code_len: default_max_action_code_len(),
            model: ModelConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Derive the sandbox engine limits from this config.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            timeout: Duration::from_millis(self.action_timeout_ms),
            max_code_len: self.max_action_code_len,
            ..EngineConfig::default()
        }
    }
}
