//! Store backed by an external query command
//!
//! The command receives the Cypher text on stdin and prints the result rows
//! as JSON on stdout. A non-zero exit is a runtime failure whose stderr is
//! the engine's error message. Schema text is supplied up front.

use super::traits::{GraphStore, StoreError, StoreResult};
use crate::process::{run_piped, split_command_line};
use crate::query::QueryResult;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct CommandStore {
    program: String,
    args: Vec<String>,
    schema: String,
}

impl CommandStore {
    pub fn new(program: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            schema: schema.into(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Build from a whitespace-separated command line.
    pub fn from_command_line(line: &str, schema: impl Into<String>) -> Option<Self> {
        let (program, args) = split_command_line(line)?;
        Some(Self {
            program,
            args,
            schema: schema.into(),
        })
    }
}

/// Decode command output; blank output is an empty row set.
fn parse_rows(stdout: &str) -> StoreResult<QueryResult> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(QueryResult::empty());
    }
    Ok(serde_json::from_str(trimmed)?)
}

#[async_trait]
impl GraphStore for CommandStore {
    async fn schema(&self) -> StoreResult<String> {
        Ok(self.schema.clone())
    }

    async fn query(&self, text: &str) -> StoreResult<QueryResult> {
        let output = run_piped(&self.program, &self.args, text)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", self.program, e)))?;

        if !output.success {
            return Err(StoreError::Execution(output.failure_message()));
        }
        parse_rows(&output.stdout)
    }
}
