//! Bounded retry with repair feedback
//!
//! Both repair loops run on this primitive. They differ only in where the
//! error signal comes from: validation reads the errors the previous repair
//! reported, runtime repair executes the query and reports the engine's
//! message. Either way a rejected candidate costs one attempt and one
//! repair call, and the loop never runs more than `budget` rounds.

use super::cancel::Cutoff;
use super::repair::QueryRepairer;
use crate::query::{Candidate, ErrorList};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Verdict on the current candidate.
#[derive(Debug)]
pub enum Signal<T> {
    /// The candidate is good; stop with this value.
    Accept(T),
    /// The candidate needs repair; these errors go to the repairer.
    Reject(ErrorList),
}

/// Where a loop gets its error signal from.
#[async_trait]
pub trait FeedbackSource: Send + Sync {
    type Accepted: Send;

    async fn check(&self, candidate: &Candidate) -> Signal<Self::Accepted>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Accepted,
    /// Every attempt was spent without acceptance.
    Exhausted,
    /// Cancelled by token or deadline. Treated like exhaustion.
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct LoopOutcome<T> {
    /// Last candidate held when the loop stopped.
    pub candidate: Candidate,
    pub accepted: Option<T>,
    /// Signals obtained (validation passes or executions).
    pub checks: usize,
    /// Repair calls made, including ones that failed.
    pub repairs: usize,
    pub stop: StopReason,
}

/// Attempt budget plus the cutoff shared by one run.
#[derive(Debug, Clone)]
pub struct LoopPolicy {
    pub budget: usize,
    pub cutoff: Cutoff,
}

impl LoopPolicy {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            cutoff: Cutoff::default(),
        }
    }

    pub fn with_cutoff(mut self, cutoff: Cutoff) -> Self {
        self.cutoff = cutoff;
        self
    }
}

/// One bounded repair loop over a single question.
///
/// Holds no state between runs; every call to `run` owns its candidate
/// and counters.
pub struct FeedbackLoop<'a> {
    label: &'static str,
    repairer: &'a QueryRepairer,
    question: &'a str,
    schema: &'a str,
    policy: LoopPolicy,
}

impl<'a> FeedbackLoop<'a> {
    pub fn new(
        label: &'static str,
        repairer: &'a QueryRepairer,
        question: &'a str,
        schema: &'a str,
        policy: LoopPolicy,
    ) -> Self {
        Self {
            label,
            repairer,
            question,
            schema,
            policy,
        }
    }

    pub async fn run<S: FeedbackSource>(
        &self,
        source: &S,
        initial: Candidate,
    ) -> LoopOutcome<S::Accepted> {
        let mut outcome = LoopOutcome {
            candidate: initial,
            accepted: None,
            checks: 0,
            repairs: 0,
            stop: StopReason::Exhausted,
        };

        while outcome.repairs < self.policy.budget {
            let Some(signal) = self.policy.cutoff.run(source.check(&outcome.candidate)).await else {
                info!(stage = self.label, attempt = outcome.repairs, "cancelled before check");
                outcome.stop = StopReason::Cancelled;
                return outcome;
            };
            outcome.checks += 1;

            let errors = match signal {
                Signal::Accept(value) => {
                    debug!(stage = self.label, checks = outcome.checks, "candidate accepted");
                    outcome.accepted = Some(value);
                    outcome.stop = StopReason::Accepted;
                    return outcome;
                }
                Signal::Reject(errors) => errors,
            };

            outcome.repairs += 1;
            debug!(
                stage = self.label,
                attempt = outcome.repairs,
                errors = errors.len(),
                "repairing candidate"
            );

            let repair = self.repairer.repair(
                self.question,
                self.schema,
                &outcome.candidate.query,
                &errors,
            );
            let repaired = self.policy.cutoff.run(repair).await;
            match repaired {
                Some(Ok(next)) => outcome.candidate = next,
                Some(Err(e)) => {
                    warn!(
                        stage = self.label,
                        attempt = outcome.repairs,
                        error = %e,
                        "repair call failed, keeping previous candidate"
                    );
                }
                None => {
                    info!(stage = self.label, attempt = outcome.repairs, "cancelled during repair");
                    outcome.stop = StopReason::Cancelled;
                    return outcome;
                }
            }
        }

        info!(stage = self.label, attempts = outcome.repairs, "attempt budget exhausted");
        outcome
    }
}
