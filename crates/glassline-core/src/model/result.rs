// ── Execution results ──

use serde::Serialize;
use strum::Display;

/// Status codes carried on results.
pub mod status_code {
    /// Accepted and executed.
    pub const VALID: u16 = 200;
    /// Query type disabled on the device, or target forbidden by policy.
    pub const NOT_ALLOWED: u16 = 405;
    /// Malformed target or transport failure.
    pub const INVALID: u16 = 415;
}

/// Terminal state of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Rejected,
    Failed,
}

/// Coarse success flag for callers that don't care why a request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Status {
    Success,
    Failure,
}

/// What a caller gets back for a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub output: String,
    pub outcome: Outcome,
    pub status_code: u16,
}

impl ExecutionResult {
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            outcome: Outcome::Succeeded,
            status_code: status_code::VALID,
        }
    }

    pub fn rejected(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            output: message.into(),
            outcome: Outcome::Rejected,
            status_code,
        }
    }

    pub fn failed(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            output: message.into(),
            outcome: Outcome::Failed,
            status_code,
        }
    }

    /// Wrap a query agent response. The remote status code is kept as is;
    /// only 2xx counts as success.
    pub fn from_response(status_code: u16, body: impl Into<String>) -> Self {
        let outcome = if (200..300).contains(&status_code) {
            Outcome::Succeeded
        } else {
            Outcome::Failed
        };
        Self {
            output: body.into(),
            outcome,
            status_code,
        }
    }

    pub fn status(&self) -> Status {
        match self.outcome {
            Outcome::Succeeded => Status::Success,
            Outcome::Rejected | Outcome::Failed => Status::Failure,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == Status::Success
    }
}
