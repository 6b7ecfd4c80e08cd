//! Scripted in-memory store for tests

use super::traits::{GraphStore, StoreError, StoreResult};
use crate::query::QueryResult;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Mock store. Replays scripted outcomes and records executed queries.
///
/// Once the script runs out the fallback outcome repeats forever; without
/// a fallback every further query fails.
pub struct MockStore {
    schema: String,
    script: Mutex<VecDeque<Result<QueryResult, String>>>,
    fallback: Option<Result<QueryResult, String>>,
    latency: Option<Duration>,
    executed: Mutex<Vec<String>>,
}

impl MockStore {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            latency: None,
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful execution.
    pub fn returning(self, result: impl Into<QueryResult>) -> Self {
        self.push(Ok(result.into()))
    }

    /// Queue a runtime failure with the engine's message.
    pub fn failing(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()))
    }

    /// Fail every query not covered by the script.
    pub fn failing_forever(mut self, message: impl Into<String>) -> Self {
        self.fallback = Some(Err(message.into()));
        self
    }

    /// Succeed with `result` for every query not covered by the script.
    pub fn returning_forever(mut self, result: impl Into<QueryResult>) -> Self {
        self.fallback = Some(Ok(result.into()));
        self
    }

    /// Delay every query by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queries in execution order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn push(self, entry: Result<QueryResult, String>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(entry);
        }
        self
    }
}

#[async_trait]
impl GraphStore for MockStore {
    async fn schema(&self) -> StoreResult<String> {
        Ok(self.schema.clone())
    }

    async fn query(&self, text: &str) -> StoreResult<QueryResult> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(text.to_string());
        }

        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .or_else(|| self.fallback.clone());

        match next {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(StoreError::Execution(message)),
            None => Err(StoreError::Unavailable("mock script exhausted".to_string())),
        }
    }
}
