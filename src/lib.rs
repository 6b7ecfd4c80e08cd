//! Cypherloop: self-correcting natural-language questions over a graph
//!
//! Turns a question into a Cypher query with a language model, reviews and
//! repairs the query before running it, repairs it again from the engine's
//! own error messages, and answers from whatever the graph returned.
//!
//! # Core Concepts
//!
//! - **Candidate**: a query plus the errors last reported against it
//! - **Repair loops**: validation before execution, runtime repair after,
//!   each bounded to a fixed number of attempts
//! - **Identifiers**: the `_id` values a result carries, reported beside the
//!   answer so callers can cite graph elements
//!
//! # Example
//!
//! ```
//! use cypherloop::canonicalize;
//!
//! assert_eq!(canonicalize("RETURN id(n)"), "RETURN elementId(n)");
//! ```

pub mod completion;
pub mod config;
pub mod pipeline;
mod process;
pub mod query;
pub mod store;

pub use completion::{CommandCompletion, CompletionClient, CompletionError, MockCompletion};
pub use config::{ConfigError, PipelineConfig};
pub use pipeline::{CancellationToken, PipelineError, PipelineRun, QueryAnswer, QueryPipeline};
pub use query::{canonicalize, extract_ids, Candidate, ErrorList, QueryResult};
pub use store::{CommandStore, GraphStore, MockStore, StoreError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
