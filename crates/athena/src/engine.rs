//! Seam between the provisioning workflow and the query engine.
//!
//! [`QueryEngine`] is the minimal surface the workflow needs: submit a
//! statement, poll its status, fetch result rows. [`AthenaEngine`] is the
//! production implementation over the AWS SDK; tests substitute a mock.

use std::fmt;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_athena::types::QueryExecutionState;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use loglens_core::ExecutionStatus;

use crate::config::EngineConfig;

/// Errors raised by engine calls. Terminal query failure is *not* an error
/// here — polling reports it as a status the workflow inspects.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An AWS SDK error (stringified), including statement rejection at
    /// submit time.
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    /// The engine accepted the statement but returned no execution ID.
    #[error("no query execution ID returned")]
    MissingExecutionId,

    /// A poll response carried no query execution record.
    #[error("no query execution in response")]
    MissingExecution,
}

/// Opaque handle to one submitted statement. Never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryExecutionId(String);

impl QueryExecutionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One observed poll response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSnapshot {
    /// Engine-reported status at poll time. When the poll budget is spent
    /// the *returned* status is `Timeout` while the paired snapshot still
    /// carries this non-terminal value.
    pub status: ExecutionStatus,
    /// Engine-provided failure reason, when present.
    pub state_change_reason: Option<String>,
}

/// Asynchronous statement execution, as the workflow consumes it.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Begin asynchronous execution of one statement. Rejection (malformed
    /// SQL, inaccessible output location) surfaces here as an error.
    async fn submit(
        &self,
        statement: &str,
        database: Option<&str>,
    ) -> Result<QueryExecutionId, EngineError>;

    /// Fetch the current status of a submitted statement.
    async fn poll(&self, id: &QueryExecutionId) -> Result<ExecutionSnapshot, EngineError>;

    /// Fetch up to `max_rows` result rows, header row included.
    async fn fetch_rows(
        &self,
        id: &QueryExecutionId,
        max_rows: i32,
    ) -> Result<Vec<Vec<Option<String>>>, EngineError>;
}

/// Production engine over `aws_sdk_athena`.
pub struct AthenaEngine {
    client: aws_sdk_athena::Client,
    config: EngineConfig,
}

impl AthenaEngine {
    /// Construct SDK clients for the configured region using the ambient
    /// credential chain.
    pub async fn connect(config: EngineConfig) -> Self {
        let region = aws_sdk_athena::config::Region::new(config.region.clone());
        let aws_cfg = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;

        let client = aws_sdk_athena::Client::new(&aws_cfg);

        info!(
            region = %config.region,
            output_location = %config.output_location,
            workgroup = %config.workgroup,
            "AthenaEngine initialised"
        );

        Self { client, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[async_trait]
impl QueryEngine for AthenaEngine {
    async fn submit(
        &self,
        statement: &str,
        database: Option<&str>,
    ) -> Result<QueryExecutionId, EngineError> {
        debug!(statement = %statement, "submitting statement");

        let mut req = self
            .client
            .start_query_execution()
            .query_string(statement)
            .result_configuration(
                aws_sdk_athena::types::ResultConfiguration::builder()
                    .output_location(&self.config.output_location)
                    .build(),
            )
            .work_group(&self.config.workgroup);

        if let Some(db) = database {
            req = req.query_execution_context(
                aws_sdk_athena::types::QueryExecutionContext::builder()
                    .database(db)
                    .build(),
            );
        }

        let resp = req
            .send()
            .await
            .map_err(|e| EngineError::AwsSdk(e.to_string()))?;

        let id = resp
            .query_execution_id()
            .ok_or(EngineError::MissingExecutionId)?
            .to_string();

        info!(query_id = %id, "query execution started");
        Ok(QueryExecutionId::new(id))
    }

    async fn poll(&self, id: &QueryExecutionId) -> Result<ExecutionSnapshot, EngineError> {
        let resp = self
            .client
            .get_query_execution()
            .query_execution_id(id.as_str())
            .send()
            .await
            .map_err(|e| EngineError::AwsSdk(e.to_string()))?;

        let qe = resp.query_execution().ok_or(EngineError::MissingExecution)?;

        let state = qe
            .status()
            .and_then(|s| s.state())
            .cloned()
            .unwrap_or(QueryExecutionState::Queued);

        let status = ExecutionStatus::from_engine_state(state.as_str());
        let state_change_reason = qe
            .status()
            .and_then(|s| s.state_change_reason())
            .map(str::to_string);

        debug!(query_id = %id, status = %status, "polled query status");

        Ok(ExecutionSnapshot {
            status,
            state_change_reason,
        })
    }

    async fn fetch_rows(
        &self,
        id: &QueryExecutionId,
        max_rows: i32,
    ) -> Result<Vec<Vec<Option<String>>>, EngineError> {
        let resp = self
            .client
            .get_query_results()
            .query_execution_id(id.as_str())
            .max_results(max_rows)
            .send()
            .await
            .map_err(|e| EngineError::AwsSdk(e.to_string()))?;

        let rows = resp
            .result_set()
            .map(|rs| {
                rs.rows()
                    .iter()
                    .map(|row| {
                        row.data()
                            .iter()
                            .map(|d| d.var_char_value().map(str::to_string))
                            .collect()
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(rows)
    }
}
