//! Pre-execution validation loop
//!
//! Repeatedly asks the repairer to review the candidate until it reports
//! no errors or the budget runs out. Running out is not fatal: the last
//! candidate is used anyway.

use super::feedback::{FeedbackLoop, FeedbackSource, LoopPolicy, Signal, StopReason};
use super::repair::QueryRepairer;
use crate::query::Candidate;
use async_trait::async_trait;
use tracing::{info, warn};

/// Signal source for validation: the errors the last repair reported.
struct ReportedErrors;

#[async_trait]
impl FeedbackSource for ReportedErrors {
    type Accepted = ();

    async fn check(&self, candidate: &Candidate) -> Signal<()> {
        if candidate.errors.is_resolved() {
            Signal::Accept(())
        } else {
            Signal::Reject(candidate.errors.clone())
        }
    }
}

#[derive(Debug, Clone)]
pub struct Validation {
    /// Best candidate available when validation stopped.
    pub candidate: Candidate,
    /// Repair calls made.
    pub attempts: usize,
    /// Whether the last review came back clean.
    pub converged: bool,
    pub stop: StopReason,
}

/// Validate and repair `query` before it is ever executed.
pub async fn validate_query(
    repairer: &QueryRepairer,
    question: &str,
    schema: &str,
    query: String,
    policy: LoopPolicy,
) -> Validation {
    let outcome = FeedbackLoop::new("validate", repairer, question, schema, policy)
        .run(&ReportedErrors, Candidate::fresh(query))
        .await;

    // The final repair may have come back clean without a further check.
    let converged = outcome.candidate.errors.is_resolved();
    if converged {
        info!(attempts = outcome.repairs, "query validated");
    } else {
        warn!(
            attempts = outcome.repairs,
            errors = outcome.candidate.errors.len(),
            "validation did not converge, continuing with best candidate"
        );
    }

    Validation {
        candidate: outcome.candidate,
        attempts: outcome.repairs,
        converged,
        stop: outcome.stop,
    }
}
