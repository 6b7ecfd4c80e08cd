//! Pipeline configuration
//!
//! Every field has a default, so an empty YAML document is a valid config.
//!
//! ```yaml
//! max_validation_attempts: 5
//! max_execution_attempts: 5
//! id_field: _id
//! result_limit: 10
//! denylist: [database, context, knowledge, available information, according to]
//! retrieval_deadline_ms: 30000
//! ```

use crate::pipeline::ProvenanceFilter;
use crate::query::DEFAULT_ID_FIELD;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Attempts allowed for each repair loop.
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Row cap the synthesis prompt asks for.
pub const DEFAULT_RESULT_LIMIT: usize = 10;

/// Vocabulary stripped from answers because it reveals the data source.
pub const DEFAULT_DENYLIST: &[&str] = &[
    "database",
    "context",
    "knowledge",
    "available information",
    "according to",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Repair rounds before validation gives up and proceeds best-effort.
    pub max_validation_attempts: usize,
    /// Executions before the result is reported absent.
    pub max_execution_attempts: usize,
    /// Column the generated queries alias node identifiers to.
    pub id_field: String,
    /// Row cap requested from the model.
    pub result_limit: usize,
    /// Whole-word, case-insensitive terms removed from answers.
    pub denylist: Vec<String>,
    /// Bound on query synthesis plus both repair loops.
    pub retrieval_deadline_ms: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_validation_attempts: DEFAULT_MAX_ATTEMPTS,
            max_execution_attempts: DEFAULT_MAX_ATTEMPTS,
            id_field: DEFAULT_ID_FIELD.to_string(),
            result_limit: DEFAULT_RESULT_LIMIT,
            denylist: DEFAULT_DENYLIST.iter().map(|t| t.to_string()).collect(),
            retrieval_deadline_ms: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not a map.
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_validation_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_validation_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_execution_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_execution_attempts must be at least 1".to_string(),
            ));
        }
        if self.id_field.trim().is_empty() {
            return Err(ConfigError::Invalid("id_field must not be empty".to_string()));
        }
        if self.result_limit == 0 {
            return Err(ConfigError::Invalid("result_limit must be at least 1".to_string()));
        }
        self.provenance_filter()?;
        Ok(())
    }

    /// Compile the denylist into the answer filter.
    pub fn provenance_filter(&self) -> Result<ProvenanceFilter, ConfigError> {
        ProvenanceFilter::new(&self.denylist)
            .map_err(|e| ConfigError::Invalid(format!("denylist does not compile: {}", e)))
    }

    pub fn retrieval_deadline(&self) -> Option<Duration> {
        self.retrieval_deadline_ms.map(Duration::from_millis)
    }

    pub fn with_max_attempts(mut self, validation: usize, execution: usize) -> Self {
        self.max_validation_attempts = validation;
        self.max_execution_attempts = execution;
        self
    }

    pub fn with_denylist<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denylist = terms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_retrieval_deadline(mut self, deadline: Duration) -> Self {
        self.retrieval_deadline_ms = Some(deadline.as_millis() as u64);
        self
    }
}
