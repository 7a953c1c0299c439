//! Operation result type

use serde::{Deserialize, Serialize};

/// Well-known result codes.
pub mod codes {
    /// The operation succeeded.
    pub const SUCCESS: i32 = 0;
    /// A supplied parameter was rejected (bad path, failed verification).
    pub const INVALID_PARAMETER: i32 = -1;
    /// A required file could not be located.
    pub const FILE_NOT_FOUND: i32 = -3;
    /// Sentinel for a result that was never resolved to success or failure.
    pub const UNRESOLVED: i32 = i32::MAX;
}

const SUCCESS_MESSAGE: &str = "Success";
const FAIL_MESSAGE: &str = "Fail";
const UNDEFINED_MESSAGE: &str = "Undefined";

/// Outcome of a launch or download operation.
///
/// `code == 0` iff the operation succeeded. `output` is always present;
/// its first line is the canonical message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpResult {
    pub code: i32,
    pub output: Vec<String>,
}

impl OpResult {
    /// An unresolved result with no output, to be marked by pipeline stages.
    pub fn new() -> Self {
        Self {
            code: codes::UNRESOLVED,
            output: Vec::new(),
        }
    }

    /// A success result with the default message.
    pub fn success() -> Self {
        Self::success_with(SUCCESS_MESSAGE)
    }

    /// A success result with a caller-supplied message.
    pub fn success_with(message: impl Into<String>) -> Self {
        Self {
            code: codes::SUCCESS,
            output: vec![message.into()],
        }
    }

    /// A failure result with the given code and message.
    pub fn fail(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            output: vec![message.into()],
        }
    }

    /// A failure result with the given code and the default message.
    pub fn fail_with_code(code: i32) -> Self {
        Self::fail(code, FAIL_MESSAGE)
    }

    pub fn is_success(&self) -> bool {
        self.code == codes::SUCCESS
    }

    pub fn is_failure(&self) -> bool {
        self.code != codes::SUCCESS
    }

    /// First output line, or `"Undefined"` when no output was recorded.
    pub fn first_output(&self) -> &str {
        self.output
            .first()
            .map(String::as_str)
            .unwrap_or(UNDEFINED_MESSAGE)
    }

    /// Append an output line.
    pub fn push_output(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    /// Mark this result as succeeded. The code from the last marker call
    /// wins; the message is appended.
    pub fn mark_success(&mut self) {
        self.code = codes::SUCCESS;
        self.output.push(SUCCESS_MESSAGE.to_string());
    }

    /// Mark this result as failed. The code from the last marker call wins;
    /// the message is appended.
    pub fn mark_fail(&mut self, message: impl Into<String>) {
        self.code = codes::INVALID_PARAMETER;
        self.output.push(message.into());
    }
}

impl Default for OpResult {
    fn default() -> Self {
        Self::new()
    }
}
