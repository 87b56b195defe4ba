//! Fixed-budget status polling and row-count extraction.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use loglens_core::ExecutionStatus;

use crate::engine::{EngineError, ExecutionSnapshot, QueryEngine, QueryExecutionId};

/// Poll cadence and budget. Defaults give the 30-attempt, one-second
/// cadence (roughly a 30-second ceiling).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Maximum status fetches before giving up. At least one poll always
    /// happens.
    pub max_attempts: u32,
    /// Sleep between non-terminal polls.
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(1),
        }
    }
}

/// Poll `id` until a terminal status is observed or the attempt budget is
/// exhausted.
///
/// Returns on the first terminal poll without polling again. When the
/// budget runs out the returned status is the synthetic
/// [`ExecutionStatus::Timeout`] paired with the *last* snapshot, whose
/// embedded status is still non-terminal — callers must not assume the two
/// agree. A transport failure while polling propagates as an error.
pub async fn await_completion<E: QueryEngine + ?Sized>(
    engine: &E,
    id: &QueryExecutionId,
    policy: &PollPolicy,
) -> Result<(ExecutionStatus, ExecutionSnapshot), EngineError> {
    let mut attempt: u32 = 0;
    loop {
        let snapshot = engine.poll(id).await?;
        if snapshot.status.is_terminal() {
            debug!(query_id = %id, status = %snapshot.status, attempt, "query reached terminal state");
            return Ok((snapshot.status, snapshot));
        }

        attempt += 1;
        if attempt >= policy.max_attempts.max(1) {
            warn!(
                query_id = %id,
                attempts = attempt,
                last_status = %snapshot.status,
                "poll budget exhausted"
            );
            return Ok((ExecutionStatus::Timeout, snapshot));
        }

        tokio::time::sleep(policy.interval).await;
    }
}

/// Row count extracted from a COUNT(*) verification query.
///
/// A tagged result instead of the historical count / `"0"` / `"Error"`
/// string trichotomy; [`RowCount::legacy_str`] reproduces the old contract
/// for callers that compare strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowCount {
    /// First data cell of the first row after the header.
    Count(String),
    /// The result set had no data rows (header only), or the cell was NULL.
    Empty,
    /// The results fetch itself failed.
    FetchFailed(String),
}

impl RowCount {
    /// The historical string view: the count, `"0"` for empty, `"Error"`
    /// for a failed fetch.
    pub fn legacy_str(&self) -> &str {
        match self {
            Self::Count(n) => n,
            Self::Empty => "0",
            Self::FetchFailed(_) => "Error",
        }
    }
}

/// Fetch the verification query's result and pull out the count cell.
/// Row 0 is the header row, so two rows are requested.
pub async fn extract_row_count<E: QueryEngine + ?Sized>(
    engine: &E,
    id: &QueryExecutionId,
) -> RowCount {
    match engine.fetch_rows(id, 2).await {
        Ok(rows) => match rows.get(1).and_then(|r| r.first()) {
            Some(Some(value)) => RowCount::Count(value.clone()),
            _ => RowCount::Empty,
        },
        Err(e) => {
            warn!(query_id = %id, error = %e, "failed to fetch row count");
            RowCount::FetchFailed(e.to_string())
        }
    }
}
