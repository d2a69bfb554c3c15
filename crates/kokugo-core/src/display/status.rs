//! One-line confirmations for edits and plan operations.

use std::fmt;

/// Outcome line printed after a command or returned by an MCP tool.
///
/// Renders as `Success: <message>` or `Error: <message>`, newline
/// terminated.
pub struct OperationStatus {
    pub message: String,
    pub success: bool,
}

impl OperationStatus {
    pub fn success(message: String) -> Self {
        Self {
            message,
            success: true,
        }
    }

    /// A non-fatal failure, e.g. a generated result discarded after a
    /// clear.
    pub fn failure(message: String) -> Self {
        Self {
            message,
            success: false,
        }
    }

    fn prefix(&self) -> &'static str {
        match self.success {
            true => "Success:",
            false => "Error:",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.prefix(), self.message)
    }
}
