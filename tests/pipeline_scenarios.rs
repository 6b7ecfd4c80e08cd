//! End-to-end pipeline scenarios against scripted collaborators
//!
//! Run with: cargo test --test pipeline_scenarios

mod common;

use common::*;
use cypherloop::config::DEFAULT_DENYLIST;
use cypherloop::pipeline::{StopReason, FALLBACK_ANSWER, REPAIR_HEADER};
use cypherloop::{
    CancellationToken, MockCompletion, MockStore, PipelineConfig, PipelineError, QueryPipeline,
};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn transformers_question_end_to_end() {
    let completion = Arc::new(routed_completion(
        TRANSFORMERS_QUERY,
        &review(TRANSFORMERS_QUERY, &[]),
        "According to the database, \"Attention Is All You Need\" was written by A. Vaswani.",
    ));
    let store = Arc::new(MockStore::new(PAPER_SCHEMA).returning(transformers_row()));
    let pipeline = QueryPipeline::new(completion.clone(), store.clone());

    let answer = pipeline.answer_via_query(TRANSFORMERS_QUESTION).await;

    assert!(answer.answer.contains("Attention Is All You Need"));
    assert!(answer.answer.contains("A. Vaswani"));
    assert_eq!(answer.identifiers, vec!["4:abc:1"]);
    for term in DEFAULT_DENYLIST {
        assert!(!mentions_word(&answer.answer, term), "answer leaks '{}'", term);
    }

    // Executed in canonical form, and the single row reached the answer prompt.
    let executed = store.executed();
    assert_eq!(executed.len(), 1);
    assert!(executed[0].contains("elementId(p) AS _id"));
    assert!(!executed[0].contains(" id(p)"));
    let answer_prompt = completion.prompts().pop().expect("answer prompt");
    let row = r#"{"Paper":"Attention Is All You Need","Authors":["A. Vaswani"],"_id":"4:abc:1"}"#;
    assert!(answer_prompt.contains(row));
}

#[tokio::test]
async fn always_failing_store_degrades_to_dont_know() {
    let query = "MATCH (p:Paper) RETURN p.title AS Paper";
    let completion = Arc::new(routed_completion(query, &review(query, &[]), "I don't know."));
    let store = Arc::new(
        MockStore::new(PAPER_SCHEMA)
            .failing_forever("Neo.ClientError.Statement.SyntaxError: Invalid input 'X'"),
    );
    let pipeline = QueryPipeline::new(completion.clone(), store.clone());

    let run = pipeline.run(TRANSFORMERS_QUESTION, &CancellationToken::new()).await;
    let retrieval = run.retrieval.as_ref().expect("retrieval completes");

    assert!(retrieval.result().is_none());
    assert_eq!(retrieval.execution.attempts, 5);
    assert_eq!(retrieval.execution.stop, StopReason::Exhausted);
    assert_eq!(store.executed().len(), 5);

    assert_eq!(run.answer.answer, "I don't know.");
    assert!(run.answer.identifiers.is_empty());
    assert!(!run.answer.answer.contains("SyntaxError"));
    let answer_prompt = completion.prompts().pop().expect("answer prompt");
    assert!(answer_prompt.ends_with("Context:\nI don't know\n"));
    assert!(!answer_prompt.contains("SyntaxError"));
}

#[tokio::test]
async fn store_failing_twice_recovers_after_two_repairs() {
    let completion = Arc::new(
        MockCompletion::new()
            .respond("MATCH (p:Paper) RETURN p.name AS Paper, id(p) AS _id")
            .respond(review("MATCH (p:Paper) RETURN p.name AS Paper, id(p) AS _id", &[]))
            .respond(review("MATCH (p:Paper) RETURN p.titel AS Paper, id(p) AS _id", &[]))
            .respond(review("MATCH (p:Paper) RETURN p.title AS Paper, id(p) AS _id", &[]))
            .respond("The paper is Attention Is All You Need."),
    );
    let store = Arc::new(
        MockStore::new(PAPER_SCHEMA)
            .failing("Unknown property 'name'")
            .failing("Unknown property 'titel'")
            .returning(json!([{ "Paper": "Attention Is All You Need", "_id": "4:abc:1" }])),
    );
    let pipeline = QueryPipeline::new(completion.clone(), store.clone());

    let run = pipeline.run("Which paper is in the graph?", &CancellationToken::new()).await;
    let retrieval = run.retrieval.as_ref().expect("retrieval completes");

    assert_eq!(retrieval.execution.repairs, 2);
    assert_eq!(retrieval.execution.attempts, 3);
    assert!(retrieval.result().is_some());
    assert_eq!(
        run.final_query(),
        Some("MATCH (p:Paper) RETURN p.title AS Paper, elementId(p) AS _id")
    );
    assert_eq!(run.answer.identifiers, vec!["4:abc:1"]);

    // Each runtime repair saw exactly the engine message that triggered it.
    let prompts = completion.prompts();
    assert!(prompts[2].contains("- Unknown property 'name'"));
    assert!(prompts[3].contains("- Unknown property 'titel'"));
}

#[tokio::test]
async fn validation_that_never_converges_is_bounded() {
    let query = "MATCH (n) RETURN n";
    let completion = Arc::new(routed_completion(
        query,
        &review(query, &["Label is missing"]),
        "I don't know.",
    ));
    let store = Arc::new(MockStore::new(PAPER_SCHEMA).returning_forever(json!([])));
    let pipeline = QueryPipeline::new(completion.clone(), store.clone());

    let run = pipeline.run("What is there?", &CancellationToken::new()).await;
    let retrieval = run.retrieval.as_ref().expect("retrieval completes");

    assert!(!retrieval.validation.converged);
    assert_eq!(retrieval.validation.attempts, 5);
    assert_eq!(completion.count_containing(REPAIR_HEADER), 5);
    // Best-effort candidate still runs, and an empty result is present, not absent.
    assert_eq!(store.executed(), vec![query]);
    assert_eq!(retrieval.result().map(|r| r.is_empty()), Some(true));
    assert_eq!(run.context.as_deref(), Some("[]"));
    assert_eq!(completion.call_count(), 7);
}

#[tokio::test]
async fn synthesis_failure_is_hard_in_retrieve_but_answered_in_run() {
    let store = Arc::new(MockStore::new(PAPER_SCHEMA));

    let completion = Arc::new(MockCompletion::new().fail("connection refused"));
    let pipeline = QueryPipeline::new(completion, store.clone());
    let err = pipeline
        .retrieve(TRANSFORMERS_QUESTION, &CancellationToken::new())
        .await
        .expect_err("no query to run");
    assert!(matches!(err, PipelineError::Synthesis(_)));

    let completion = Arc::new(
        MockCompletion::new()
            .fail("connection refused")
            .respond("I don't know."),
    );
    let pipeline = QueryPipeline::new(completion, store.clone());
    let answer = pipeline.answer_via_query(TRANSFORMERS_QUESTION).await;
    assert_eq!(answer.answer, "I don't know.");
    assert!(answer.identifiers.is_empty());
    assert!(store.executed().is_empty());
}

#[tokio::test]
async fn answer_failure_returns_fallback_with_identifiers() {
    let completion = Arc::new(
        MockCompletion::new()
            .route(cypherloop::pipeline::SYNTHESIS_HEADER, TRANSFORMERS_QUERY)
            .route(REPAIR_HEADER, review(TRANSFORMERS_QUERY, &[])),
    );
    let store = Arc::new(MockStore::new(PAPER_SCHEMA).returning(transformers_row()));
    let pipeline = QueryPipeline::new(completion, store);

    let answer = pipeline.answer_via_query(TRANSFORMERS_QUESTION).await;

    assert_eq!(answer.answer, FALLBACK_ANSWER);
    assert_eq!(answer.identifiers, vec!["4:abc:1"]);
}

#[tokio::test]
async fn cancelled_token_never_touches_the_store() {
    let completion = Arc::new(routed_completion(
        TRANSFORMERS_QUERY,
        &review(TRANSFORMERS_QUERY, &[]),
        "I don't know.",
    ));
    let store = Arc::new(MockStore::new(PAPER_SCHEMA).returning_forever(transformers_row()));
    let pipeline = QueryPipeline::new(completion.clone(), store.clone());
    let token = CancellationToken::new();
    token.cancel();

    let run = pipeline.run(TRANSFORMERS_QUESTION, &token).await;

    assert!(matches!(run.failure, Some(PipelineError::Cancelled)));
    assert!(store.executed().is_empty());
    assert_eq!(run.answer.answer, "I don't know.");
    assert_eq!(completion.call_count(), 1);
}

#[tokio::test]
async fn retrieval_deadline_cuts_off_slow_store() {
    let completion = Arc::new(routed_completion(
        TRANSFORMERS_QUERY,
        &review(TRANSFORMERS_QUERY, &[]),
        "I don't know.",
    ));
    let store = Arc::new(
        MockStore::new(PAPER_SCHEMA)
            .returning_forever(transformers_row())
            .with_latency(Duration::from_secs(5)),
    );
    let config = PipelineConfig::default().with_retrieval_deadline(Duration::from_millis(100));
    let pipeline = QueryPipeline::with_config(completion, store.clone(), config).unwrap();

    let started = Instant::now();
    let run = pipeline.run(TRANSFORMERS_QUESTION, &CancellationToken::new()).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    let retrieval = run.retrieval.as_ref().expect("loops report cancellation, not failure");
    assert_eq!(retrieval.execution.stop, StopReason::Cancelled);
    assert!(retrieval.result().is_none());
    assert!(store.executed().is_empty());
    assert_eq!(run.answer.answer, "I don't know.");
}

#[tokio::test]
async fn concurrent_questions_do_not_share_state() {
    let completion = Arc::new(TopicCompletion {
        topics: vec!["alpha", "beta"],
    });
    let pipeline = QueryPipeline::new(completion, Arc::new(LabelStore));

    let (alpha, beta) = tokio::join!(
        pipeline.answer_via_query("How many alpha nodes are there?"),
        pipeline.answer_via_query("How many beta nodes are there?"),
    );

    assert_eq!(alpha.identifiers, vec!["alpha-1"]);
    assert_eq!(alpha.answer, "There is one alpha node.");
    assert_eq!(beta.identifiers, vec!["beta-1"]);
    assert_eq!(beta.answer, "There is one beta node.");
}

#[tokio::test]
async fn budgets_from_config_file_are_respected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_execution_attempts: 2\ndenylist: [graph]").unwrap();
    let config = PipelineConfig::load(file.path()).unwrap();
    assert_eq!(config.max_validation_attempts, 5);

    let query = "MATCH (n) RETURN n";
    let completion = Arc::new(routed_completion(
        query,
        &review(query, &[]),
        "The graph has no answer, but the database might.",
    ));
    let store = Arc::new(MockStore::new(PAPER_SCHEMA).failing_forever("boom"));
    let pipeline = QueryPipeline::with_config(completion, store.clone(), config).unwrap();

    let answer = pipeline.answer_via_query("q").await;

    assert_eq!(store.executed().len(), 2);
    // Only the configured vocabulary is stripped.
    assert_eq!(answer.answer, "The  has no answer, but the database might.");
}
