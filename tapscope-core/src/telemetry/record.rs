//! Outcome records: one row of telemetry per tap invocation.
//!
//! Serialized field names follow the report schema the export layer reads:
//!
//! ```json
//! {
//!   "hook": "compile",
//!   "tapName": "my-plugin",
//!   "type": "sync",
//!   "startAt": 1700000000000,
//!   "endAt": 1700000000005,
//!   "costs": 5,
//!   "result": null,
//!   "error": []
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::backtrace::BacktraceStatus;

use crate::hooks::{TapError, TapKind};

/// Structured, transport-safe view of a tap error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TapErrorDescriptor {
    /// `"<tap> <hook> Error"`
    pub title: String,

    /// Top-level error message
    pub message: String,

    /// Captured backtrace, or the error's cause chain when none was captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    /// Render without a surrounding code frame
    pub hide_code_frame: bool,

    /// Render without ANSI color codes
    pub no_color: bool,
}

impl TapErrorDescriptor {
    pub fn from_tap_error(tap_name: &str, hook_name: &str, error: &TapError) -> Self {
        Self {
            title: error_title(tap_name, hook_name),
            message: error.to_string(),
            stack: stack_of(error),
            hide_code_frame: true,
            no_color: true,
        }
    }
}

/// Composite title for a failed tap.
pub fn error_title(tap_name: &str, hook_name: &str) -> String {
    format!("{tap_name} {hook_name} Error")
}

fn stack_of(error: &TapError) -> Option<String> {
    let backtrace = error.backtrace();
    if backtrace.status() == BacktraceStatus::Captured {
        return Some(backtrace.to_string());
    }

    let causes: Vec<String> = error.chain().skip(1).map(|cause| cause.to_string()).collect();
    if causes.is_empty() {
        return None;
    }

    let mut stack = String::from("Caused by:");
    for (i, cause) in causes.iter().enumerate() {
        stack.push_str(&format!("\n  {i}: {cause}"));
    }
    Some(stack)
}

/// One tap invocation's timing and outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    pub hook: String,

    pub tap_name: String,

    #[serde(rename = "type")]
    pub kind: TapKind,

    /// Milliseconds since the Unix epoch
    pub start_at: u64,

    /// Milliseconds since the Unix epoch
    pub end_at: u64,

    /// `end_at - start_at`, in milliseconds
    pub costs: u64,

    /// Always null. Tap results are never embedded: they can be arbitrary
    /// host objects and aren't needed for cost or error analysis.
    pub result: Option<Value>,

    /// Empty on success, one descriptor on failure
    #[serde(default)]
    pub error: Vec<TapErrorDescriptor>,
}

impl OutcomeRecord {
    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}
