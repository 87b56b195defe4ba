use std::fmt;

use serde::{Deserialize, Serialize};

/// Execution state of one submitted statement.
///
/// `Queued` and `Running` come straight from the engine and are
/// non-terminal. `Timeout` is synthesised client-side when the poll budget
/// runs out; the engine itself never reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    Timeout,
}

impl ExecutionStatus {
    /// Terminal states stop the poll loop. `Timeout` counts as terminal so
    /// callers can treat the exhausted budget like any other halt.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Queued | Self::Running)
    }

    /// Parse the engine's state string. Unknown states are treated as
    /// queued so polling continues rather than misreporting a failure.
    pub fn from_engine_state(state: &str) -> Self {
        match state {
            "QUEUED" => Self::Queued,
            "RUNNING" => Self::Running,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "CANCELLED" => Self::Cancelled,
            _ => Self::Queued,
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Timeout => "TIMEOUT",
        };
        f.write_str(s)
    }
}
