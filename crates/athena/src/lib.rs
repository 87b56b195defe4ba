pub mod config;
pub mod engine;
pub mod poll;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use config::EngineConfig;
pub use engine::{AthenaEngine, EngineError, ExecutionSnapshot, QueryEngine, QueryExecutionId};
pub use poll::{await_completion, extract_row_count, PollPolicy, RowCount};
pub use workflow::{provision, ProvisionOutcome, ProvisionReport, Stage, StageOutcome};
