//! QueryPipeline: the question-answering entry point
//!
//! synthesize → validate loop → canonicalize → execute loop →
//! identifiers + context → answer → strip.
//!
//! Each call owns its candidate, error list and counters. The clients are
//! shared and may serve concurrent questions.

use super::answer::AnswerSynthesizer;
use super::cancel::{CancellationToken, Cutoff};
use super::execute::{execute_with_repair, Execution};
use super::feedback::LoopPolicy;
use super::repair::QueryRepairer;
use super::synthesize::QuerySynthesizer;
use super::validate::{validate_query, Validation};
use crate::completion::{CompletionClient, CompletionError};
use crate::config::{ConfigError, PipelineConfig};
use crate::query::{canonicalize, extract_ids, QueryResult};
use crate::store::{GraphStore, StoreError};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Failures that leave retrieval with no query to run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not read graph schema: {0}")]
    Schema(#[from] StoreError),

    #[error("could not synthesize a query: {0}")]
    Synthesis(#[from] CompletionError),

    #[error("retrieval cancelled")]
    Cancelled,
}

/// What the orchestrator gets back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub identifiers: Vec<String>,
}

/// Output of the retrieval half: both loop outcomes.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub validation: Validation,
    pub execution: Execution,
}

impl Retrieval {
    pub fn result(&self) -> Option<&QueryResult> {
        self.execution.result.as_ref()
    }
}

/// Full trace of one question, for callers that want diagnostics.
///
/// Nothing here besides `answer` is meant for end users.
#[derive(Debug)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub answer: QueryAnswer,
    pub retrieval: Option<Retrieval>,
    pub failure: Option<PipelineError>,
    /// Serialized result handed to answer synthesis.
    pub context: Option<String>,
}

impl PipelineRun {
    /// The last query the pipeline executed or would have executed.
    pub fn final_query(&self) -> Option<&str> {
        self.retrieval.as_ref().map(|r| r.execution.query.as_str())
    }
}

pub struct QueryPipeline {
    store: Arc<dyn GraphStore>,
    synthesizer: QuerySynthesizer,
    repairer: QueryRepairer,
    answerer: AnswerSynthesizer,
    config: PipelineConfig,
}

impl QueryPipeline {
    /// Pipeline with the default budgets and denylist.
    pub fn new(completion: Arc<dyn CompletionClient>, store: Arc<dyn GraphStore>) -> Self {
        Self::with_config(completion, store, PipelineConfig::default())
            .expect("default configuration is valid")
    }

    /// Pipeline with `config`, which is validated first.
    pub fn with_config(
        completion: Arc<dyn CompletionClient>,
        store: Arc<dyn GraphStore>,
        config: PipelineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let filter = config.provenance_filter()?;
        Ok(Self {
            store,
            synthesizer: QuerySynthesizer::new(
                completion.clone(),
                config.id_field.clone(),
                config.result_limit,
            ),
            repairer: QueryRepairer::new(completion.clone(), config.id_field.clone()),
            answerer: AnswerSynthesizer::new(completion, filter),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Answer `question` through the graph. Never fails.
    pub async fn answer_via_query(&self, question: &str) -> QueryAnswer {
        self.answer_with_cancel(question, &CancellationToken::new()).await
    }

    /// Like `answer_via_query`, stopping retrieval early once `cancel` fires.
    pub async fn answer_with_cancel(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> QueryAnswer {
        self.run(question, cancel).await.answer
    }

    /// Run the whole pipeline and keep the trace.
    ///
    /// Retrieval failures of any kind degrade to answering without results;
    /// a failed answer call degrades to the fixed fallback answer.
    pub async fn run(&self, question: &str, cancel: &CancellationToken) -> PipelineRun {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id);

        async move {
            info!(question, "answering via graph query");

            let (retrieval, failure) = match self.retrieve(question, cancel).await {
                Ok(retrieval) => (Some(retrieval), None),
                Err(e) => {
                    warn!(error = %e, "retrieval failed, answering without results");
                    (None, Some(e))
                }
            };

            let result = retrieval.as_ref().and_then(Retrieval::result);
            let identifiers = extract_ids(result, &self.config.id_field);
            let context = result.map(QueryResult::context_string);

            let answer = match self
                .answerer
                .synthesize_answer(question, context.as_deref())
                .await
            {
                Ok(answer) => answer,
                Err(e) => {
                    warn!(error = %e, "answer synthesis failed, using fallback");
                    self.answerer.fallback()
                }
            };

            info!(identifiers = identifiers.len(), "answer ready");
            PipelineRun {
                run_id,
                answer: QueryAnswer { answer, identifiers },
                retrieval,
                failure,
                context,
            }
        }
        .instrument(span)
        .await
    }

    /// Synthesize, validate and execute a query for `question`.
    ///
    /// Only schema and synthesis failures are errors; both loops always
    /// produce an outcome, possibly with an absent result.
    pub async fn retrieve(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<Retrieval, PipelineError> {
        let deadline = self.config.retrieval_deadline().map(|d| Instant::now() + d);
        let cutoff = Cutoff::new(cancel.clone()).with_deadline(deadline);
        let policy = |budget: usize| LoopPolicy::new(budget).with_cutoff(cutoff.clone());

        let schema = cutoff
            .run(self.store.schema())
            .await
            .ok_or(PipelineError::Cancelled)??;
        let query = cutoff
            .run(self.synthesizer.synthesize(question, &schema))
            .await
            .ok_or(PipelineError::Cancelled)??;

        let validation = validate_query(
            &self.repairer,
            question,
            &schema,
            query,
            policy(self.config.max_validation_attempts),
        )
        .await;

        let query = canonicalize(&validation.candidate.query);
        let execution = execute_with_repair(
            self.store.as_ref(),
            &self.repairer,
            question,
            &query,
            &schema,
            policy(self.config.max_execution_attempts),
        )
        .await;

        Ok(Retrieval {
            validation,
            execution,
        })
    }
}
