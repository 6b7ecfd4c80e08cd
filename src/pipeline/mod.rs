//! The text-to-query pipeline
//!
//! Generation, two bounded repair loops, execution, identifier extraction
//! and answer synthesis, wired together by [`QueryPipeline`].

mod answer;
mod cancel;
mod engine;
mod execute;
mod feedback;
mod prompts;
mod repair;
mod synthesize;
mod validate;

pub use answer::{AnswerSynthesizer, ProvenanceFilter, FALLBACK_ANSWER, MISSING_CONTEXT};
pub use cancel::{CancellationToken, Cutoff};
pub use engine::{PipelineError, PipelineRun, QueryAnswer, QueryPipeline, Retrieval};
pub use execute::{execute_with_repair, Executed, Execution};
pub use feedback::{FeedbackLoop, FeedbackSource, LoopOutcome, LoopPolicy, Signal, StopReason};
pub use prompts::{ANSWER_HEADER, REPAIR_HEADER, SYNTHESIS_HEADER};
pub use repair::{QueryRepairer, RepairError};
pub use synthesize::QuerySynthesizer;
pub use validate::{validate_query, Validation};
