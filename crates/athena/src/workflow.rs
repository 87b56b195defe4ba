//! The provisioning workflow: database, table, verification count.
//!
//! Strictly sequential — each statement is polled to a terminal state
//! before the next is submitted, and the first non-success halts the run.
//! There is no retry policy; a halted stage is reported once.

use serde::{Deserialize, Serialize};
use tracing::info;

use loglens_core::{ddl, ExecutionStatus, LogLocation, TableSpec};

use crate::engine::{EngineError, QueryEngine, QueryExecutionId};
use crate::poll::{await_completion, extract_row_count, PollPolicy, RowCount};

/// The three workflow stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    CreateDatabase,
    CreateTable,
    CountRows,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CreateDatabase => "create database",
            Self::CreateTable => "create table",
            Self::CountRows => "count rows",
        };
        f.write_str(s)
    }
}

/// Terminal record of one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub query_id: QueryExecutionId,
    pub status: ExecutionStatus,
    /// Engine-provided failure reason, when one was reported.
    pub reason: Option<String>,
}

/// How the run ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProvisionOutcome {
    /// All three stages succeeded; carries the verification count.
    Completed { row_count: RowCount },
    /// A stage finished in a non-success state and the run halted there.
    /// `Timeout` halts exactly like `Failed`.
    Halted {
        stage: Stage,
        status: ExecutionStatus,
        reason: Option<String>,
    },
}

/// Full record of one provisioning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub database: String,
    pub table: String,
    pub location: String,
    pub stages: Vec<StageOutcome>,
    pub outcome: ProvisionOutcome,
}

impl ProvisionReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, ProvisionOutcome::Completed { .. })
    }

    /// One-line human summary of the run.
    pub fn summary(&self) -> String {
        match &self.outcome {
            ProvisionOutcome::Completed { row_count } => {
                format!("table created, {} rows", row_count.legacy_str())
            }
            ProvisionOutcome::Halted {
                stage,
                status,
                reason,
            } => match reason {
                Some(reason) => format!("{stage} failed: {status} ({reason})"),
                None => format!("{stage} failed: {status}"),
            },
        }
    }
}

/// Run the full workflow against `engine`.
///
/// Returns `Err` only for transport-level failures (submit rejection, a
/// poll that errors); an engine-side FAILED/CANCELLED/TIMEOUT is a normal
/// halted report.
pub async fn provision<E: QueryEngine + ?Sized>(
    engine: &E,
    spec: &TableSpec,
    location: &LogLocation,
    policy: &PollPolicy,
) -> Result<ProvisionReport, EngineError> {
    let uri = location.uri();
    let mut stages = Vec::new();

    info!(database = %spec.database, table = %spec.table, location = %uri, "provisioning started");

    // 1. Database. No database context yet — it does not exist.
    let outcome = run_stage(
        engine,
        Stage::CreateDatabase,
        &ddl::create_database(&spec.database),
        None,
        policy,
    )
    .await?;
    let halted = halt_if_failed(&outcome);
    stages.push(outcome);
    if let Some(outcome) = halted {
        return Ok(report(spec, uri, stages, outcome));
    }

    // 2. External table.
    let outcome = run_stage(
        engine,
        Stage::CreateTable,
        &ddl::create_table(&spec.database, &spec.table, &uri),
        Some(&spec.database),
        policy,
    )
    .await?;
    let halted = halt_if_failed(&outcome);
    stages.push(outcome);
    if let Some(outcome) = halted {
        return Ok(report(spec, uri, stages, outcome));
    }

    // 3. Verification count.
    let outcome = run_stage(
        engine,
        Stage::CountRows,
        &ddl::count_rows(&spec.database, &spec.table),
        Some(&spec.database),
        policy,
    )
    .await?;
    let halted = halt_if_failed(&outcome);
    let query_id = outcome.query_id.clone();
    stages.push(outcome);
    if let Some(outcome) = halted {
        return Ok(report(spec, uri, stages, outcome));
    }

    let row_count = extract_row_count(engine, &query_id).await;
    info!(database = %spec.database, table = %spec.table, count = %row_count.legacy_str(), "provisioning complete");

    Ok(report(
        spec,
        uri,
        stages,
        ProvisionOutcome::Completed { row_count },
    ))
}

async fn run_stage<E: QueryEngine + ?Sized>(
    engine: &E,
    stage: Stage,
    statement: &str,
    database: Option<&str>,
    policy: &PollPolicy,
) -> Result<StageOutcome, EngineError> {
    info!(stage = %stage, "submitting statement");
    let query_id = engine.submit(statement, database).await?;
    let (status, snapshot) = await_completion(engine, &query_id, policy).await?;
    info!(stage = %stage, query_id = %query_id, status = %status, "stage finished");

    Ok(StageOutcome {
        stage,
        query_id,
        status,
        reason: snapshot.state_change_reason,
    })
}

fn halt_if_failed(outcome: &StageOutcome) -> Option<ProvisionOutcome> {
    if outcome.status == ExecutionStatus::Succeeded {
        None
    } else {
        Some(ProvisionOutcome::Halted {
            stage: outcome.stage,
            status: outcome.status,
            reason: outcome.reason.clone(),
        })
    }
}

fn report(
    spec: &TableSpec,
    location: String,
    stages: Vec<StageOutcome>,
    outcome: ProvisionOutcome,
) -> ProvisionReport {
    ProvisionReport {
        database: spec.database.clone(),
        table: spec.table.clone(),
        location,
        stages,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEngine;
    use std::time::Duration;

    fn fast_policy() -> PollPolicy {
        PollPolicy {
            max_attempts: 30,
            interval: Duration::ZERO,
        }
    }

    fn spec_and_location() -> (TableSpec, LogLocation) {
        (
            TableSpec::for_bucket("my-app.logs"),
            LogLocation::new("my-app.logs", None),
        )
    }

    #[tokio::test]
    async fn full_run_reports_row_count() {
        let engine = MockEngine::succeeding_after(2).with_rows(vec![
            vec![Some("row_count".to_string())],
            vec![Some("1342".to_string())],
        ]);
        let (spec, location) = spec_and_location();

        let report = provision(&engine, &spec, &location, &fast_policy())
            .await
            .unwrap();

        assert!(report.succeeded());
        assert_eq!(report.database, "s3_logs_my_app_logs");
        assert_eq!(report.table, "access_logs");
        assert_eq!(report.location, "s3://my-app.logs/");
        assert_eq!(report.stages.len(), 3);
        assert_eq!(report.summary(), "table created, 1342 rows");
    }

    #[tokio::test]
    async fn statements_run_in_order_with_database_context() {
        let engine = MockEngine::succeeding_after(0).with_rows(vec![
            vec![Some("row_count".to_string())],
            vec![Some("0".to_string())],
        ]);
        let (spec, location) = spec_and_location();

        provision(&engine, &spec, &location, &fast_policy())
            .await
            .unwrap();

        let subs = engine.submissions();
        assert_eq!(subs.len(), 3);

        // Database creation runs without a database context.
        assert_eq!(
            subs[0].0,
            "CREATE DATABASE IF NOT EXISTS s3_logs_my_app_logs"
        );
        assert_eq!(subs[0].1, None);

        // Table creation and the count run inside the new database.
        assert!(subs[1]
            .0
            .starts_with("CREATE EXTERNAL TABLE IF NOT EXISTS `s3_logs_my_app_logs.access_logs`("));
        assert!(subs[1].0.ends_with("'s3://my-app.logs/'"));
        assert_eq!(subs[1].1.as_deref(), Some("s3_logs_my_app_logs"));

        assert_eq!(
            subs[2].0,
            "SELECT COUNT(*) as row_count FROM s3_logs_my_app_logs.access_logs"
        );
        assert_eq!(subs[2].1.as_deref(), Some("s3_logs_my_app_logs"));
    }

    #[tokio::test]
    async fn halts_on_first_failure() {
        let engine = MockEngine::failing_with("Insufficient permissions");
        let (spec, location) = spec_and_location();

        let report = provision(&engine, &spec, &location, &fast_policy())
            .await
            .unwrap();

        assert!(!report.succeeded());
        assert_eq!(report.stages.len(), 1);
        assert_eq!(engine.submissions().len(), 1);
        assert_eq!(
            report.summary(),
            "create database failed: FAILED (Insufficient permissions)"
        );
    }

    #[tokio::test]
    async fn timeout_halts_like_failure() {
        let engine = MockEngine::never_finishing();
        let (spec, location) = spec_and_location();

        let report = provision(&engine, &spec, &location, &fast_policy())
            .await
            .unwrap();

        assert!(!report.succeeded());
        // Nothing past the timed-out stage was submitted.
        assert_eq!(engine.submissions().len(), 1);
        match &report.outcome {
            ProvisionOutcome::Halted { stage, status, .. } => {
                assert_eq!(*stage, Stage::CreateDatabase);
                assert_eq!(*status, ExecutionStatus::Timeout);
            }
            other => panic!("expected halt, got {other:?}"),
        }
        assert_eq!(report.summary(), "create database failed: TIMEOUT");
    }

    #[tokio::test]
    async fn empty_table_still_completes() {
        let engine = MockEngine::succeeding_after(0)
            .with_rows(vec![vec![Some("row_count".to_string())]]);
        let (spec, location) = spec_and_location();

        let report = provision(&engine, &spec, &location, &fast_policy())
            .await
            .unwrap();

        assert!(report.succeeded());
        match &report.outcome {
            ProvisionOutcome::Completed { row_count } => {
                assert_eq!(*row_count, RowCount::Empty);
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(report.summary(), "table created, 0 rows");
    }
}
