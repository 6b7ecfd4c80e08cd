//! Execution with runtime repair
//!
//! Runs the canonicalized candidate against the store. When the engine
//! rejects it, the engine's message becomes the sole error handed to the
//! repairer and the repaired query is tried again. Every attempt is
//! canonicalized first because a repair may reintroduce `id(..)`.

use super::feedback::{FeedbackLoop, FeedbackSource, LoopPolicy, Signal, StopReason};
use super::repair::QueryRepairer;
use crate::query::{canonicalize, Candidate, ErrorList, QueryResult};
use crate::store::GraphStore;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// A query the store accepted, with what it returned.
#[derive(Debug, Clone)]
pub struct Executed {
    pub query: String,
    pub result: QueryResult,
}

/// Signal source for runtime repair: an execution attempt.
struct StoreExecution<'a> {
    store: &'a dyn GraphStore,
}

#[async_trait]
impl<'a> FeedbackSource for StoreExecution<'a> {
    type Accepted = Executed;

    async fn check(&self, candidate: &Candidate) -> Signal<Executed> {
        let query = canonicalize(&candidate.query);
        debug!(query = %query, "executing query");
        match self.store.query(&query).await {
            Ok(result) => Signal::Accept(Executed { query, result }),
            Err(e) => {
                warn!(error = %e, "query execution failed");
                Signal::Reject(ErrorList::checked([e.to_string()]))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Execution {
    /// Absent when no attempt succeeded; distinct from an empty row set.
    pub result: Option<QueryResult>,
    /// The executed query, or the last repaired candidate if none ran.
    pub query: String,
    /// Executions attempted.
    pub attempts: usize,
    /// Repair calls made.
    pub repairs: usize,
    pub stop: StopReason,
}

/// Execute `query`, repairing on runtime errors up to the policy budget.
///
/// Never fails: exhaustion and cancellation both come back as an absent
/// result.
pub async fn execute_with_repair(
    store: &dyn GraphStore,
    repairer: &QueryRepairer,
    question: &str,
    query: &str,
    schema: &str,
    policy: LoopPolicy,
) -> Execution {
    let source = StoreExecution { store };
    let outcome = FeedbackLoop::new("execute", repairer, question, schema, policy)
        .run(&source, Candidate::new(query, ErrorList::Checked(Vec::new())))
        .await;

    match outcome.accepted {
        Some(executed) => {
            info!(
                attempts = outcome.checks,
                rows = executed.result.row_count(),
                "query executed"
            );
            Execution {
                result: Some(executed.result),
                query: executed.query,
                attempts: outcome.checks,
                repairs: outcome.repairs,
                stop: outcome.stop,
            }
        }
        None => {
            warn!(attempts = outcome.checks, "no successful execution, result absent");
            Execution {
                result: None,
                query: canonicalize(&outcome.candidate.query),
                attempts: outcome.checks,
                repairs: outcome.repairs,
                stop: outcome.stop,
            }
        }
    }
}
