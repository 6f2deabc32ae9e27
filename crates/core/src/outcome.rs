//! Execution Outcomes
//!
//! The result types shared between the agent loop, the response parser,
//! and the sandboxed execution engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Structured view of one model response, extracted by the response parser.
///
/// Each field is present at most once per response. All three absent means
/// the parse failed and the loop must not guess further.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResponse {
    /// Free-form reasoning text, streamed to the caller when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Action code to execute in the sandbox.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Final reply; ends the turn loop when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

impl ParsedResponse {
    /// True when no field at all could be extracted.
    pub fn is_empty(&self) -> bool {
        self.reasoning.is_none() && self.action.is_none() && self.reply.is_none()
    }
}

/// Result of executing one action snippet in the sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Whether the execution was successful
    pub success: bool,
    /// Serialized result value (if successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Sanitized error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time spent executing
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ExecutionOutcome {
    /// Create a successful outcome
    pub fn ok(value: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: true,
            value: Some(value.into()),
            error: None,
            elapsed,
        }
    }

    /// Create a failed outcome
    pub fn err(error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(error.into()),
            elapsed,
        }
    }

    /// Render the outcome as the synthetic feedback message the model sees
    /// on its next turn.
    pub fn to_feedback(&self) -> String {
        if self.success {
            format!(
                "[action-result]\n{}",
                self.value.as_deref().unwrap_or("null")
            )
        } else {
            format!(
                "[action-error]\n{}",
                self.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}
