//! In-memory engine used by poll and workflow tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use loglens_core::ExecutionStatus;

use crate::engine::{EngineError, ExecutionSnapshot, QueryEngine, QueryExecutionId};

#[derive(Default)]
struct MockState {
    submissions: Vec<(String, Option<String>)>,
    polls: HashMap<String, u32>,
}

/// Scripted engine: every submission behaves the same way, reaching
/// `terminal` after `polls_before_done` non-terminal polls.
pub(crate) struct MockEngine {
    polls_before_done: u32,
    terminal: ExecutionStatus,
    reason: Option<String>,
    rows: Vec<Vec<Option<String>>>,
    fail_fetch: bool,
    state: Mutex<MockState>,
}

impl MockEngine {
    fn new(polls_before_done: u32, terminal: ExecutionStatus, reason: Option<String>) -> Self {
        Self {
            polls_before_done,
            terminal,
            reason,
            rows: Vec::new(),
            fail_fetch: false,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Succeeds after `n` polls report RUNNING.
    pub fn succeeding_after(n: u32) -> Self {
        Self::new(n, ExecutionStatus::Succeeded, None)
    }

    /// Reports RUNNING forever.
    pub fn never_finishing() -> Self {
        Self::new(u32::MAX, ExecutionStatus::Succeeded, None)
    }

    /// Fails on the first poll with the given state-change reason.
    pub fn failing_with(reason: &str) -> Self {
        Self::new(0, ExecutionStatus::Failed, Some(reason.to_string()))
    }

    pub fn with_rows(mut self, rows: Vec<Vec<Option<String>>>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    pub fn polls_for(&self, id: &QueryExecutionId) -> u32 {
        let state = self.state.lock().unwrap();
        state.polls.get(id.as_str()).copied().unwrap_or(0)
    }

    /// Statements submitted so far, with their database context.
    pub fn submissions(&self) -> Vec<(String, Option<String>)> {
        self.state.lock().unwrap().submissions.clone()
    }
}

#[async_trait]
impl QueryEngine for MockEngine {
    async fn submit(
        &self,
        statement: &str,
        database: Option<&str>,
    ) -> Result<QueryExecutionId, EngineError> {
        let mut state = self.state.lock().unwrap();
        state
            .submissions
            .push((statement.to_string(), database.map(str::to_string)));
        Ok(QueryExecutionId::new(format!("q-{}", state.submissions.len())))
    }

    async fn poll(&self, id: &QueryExecutionId) -> Result<ExecutionSnapshot, EngineError> {
        let mut state = self.state.lock().unwrap();
        let count = state.polls.entry(id.as_str().to_string()).or_insert(0);
        *count += 1;

        if *count > self.polls_before_done {
            Ok(ExecutionSnapshot {
                status: self.terminal,
                state_change_reason: self.reason.clone(),
            })
        } else {
            Ok(ExecutionSnapshot {
                status: ExecutionStatus::Running,
                state_change_reason: None,
            })
        }
    }

    async fn fetch_rows(
        &self,
        _id: &QueryExecutionId,
        _max_rows: i32,
    ) -> Result<Vec<Vec<Option<String>>>, EngineError> {
        if self.fail_fetch {
            return Err(EngineError::AwsSdk("connection reset".into()));
        }
        Ok(self.rows.clone())
    }
}
