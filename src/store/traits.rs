//! Graph store trait definitions

use crate::query::QueryResult;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur talking to the graph store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("graph store not available: {0}")]
    Unavailable(String),

    /// The engine rejected the query. The message is the engine's own and
    /// is what runtime repair feeds back to the model.
    #[error("{0}")]
    Execution(String),

    #[error("unreadable store response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A graph database the pipeline can describe and query.
///
/// Implementations may be shared between concurrent questions; they hold
/// connections, never per-question state.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Textual description of labels, relationship types and properties.
    async fn schema(&self) -> StoreResult<String>;

    /// Execute a read query and return its rows.
    async fn query(&self, text: &str) -> StoreResult<QueryResult>;
}
