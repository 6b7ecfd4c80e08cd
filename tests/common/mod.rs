//! Shared fixtures for pipeline scenario tests
//!
//! A small paper/author graph, canned model responses and a pair of
//! deterministic collaborators for tests that need responses keyed on the
//! prompt rather than on call order.

use async_trait::async_trait;
use cypherloop::pipeline::{ANSWER_HEADER, REPAIR_HEADER, SYNTHESIS_HEADER};
use cypherloop::store::StoreResult;
use cypherloop::{CompletionClient, CompletionError, GraphStore, MockCompletion, QueryResult};
use serde_json::{json, Value};
use std::time::Duration;

pub const PAPER_SCHEMA: &str = "Node properties:
Paper {title: STRING, year: INTEGER}
Person {name: STRING}
Relationship properties:
AUTHORED {}
The relationships:
(:Person)-[:AUTHORED]->(:Paper)";

pub const TRANSFORMERS_QUESTION: &str = "Who authored the paper about transformers?";

pub const TRANSFORMERS_QUERY: &str = "MATCH (a:Person)-[:AUTHORED]->(p:Paper) \
WHERE toLower(p.title) CONTAINS 'attention' \
RETURN p.title AS Paper, collect(a.name) AS Authors, id(p) AS _id LIMIT 10";

/// The single row the store holds for the transformers paper.
pub fn transformers_row() -> Value {
    json!([{
        "Paper": "Attention Is All You Need",
        "Authors": ["A. Vaswani"],
        "_id": "4:abc:1"
    }])
}

/// Repair response reporting `query` with the given errors.
pub fn review(query: &str, errors: &[&str]) -> String {
    json!({ "cypher": query, "errors": errors }).to_string()
}

/// Completion mock answering each prompt kind with a fixed response.
pub fn routed_completion(synthesized: &str, reviewed: &str, answer: &str) -> MockCompletion {
    MockCompletion::new()
        .route(SYNTHESIS_HEADER, synthesized)
        .route(REPAIR_HEADER, reviewed)
        .route(ANSWER_HEADER, answer)
}

/// True when `text` contains `term` as a whole word, ignoring case.
pub fn mentions_word(text: &str, term: &str) -> bool {
    let text = text.to_lowercase();
    let term = term.to_lowercase();
    text.match_indices(&term).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + term.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Completion client that answers from the topic word found in the prompt.
///
/// Every prompt for a question carries the question, so concurrent runs
/// about different topics get consistent, distinguishable responses.
pub struct TopicCompletion {
    pub topics: Vec<&'static str>,
}

impl TopicCompletion {
    pub fn label(topic: &str) -> String {
        let mut chars = topic.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn query_for(topic: &str) -> String {
        format!("MATCH (n:{}) RETURN id(n) AS _id", Self::label(topic))
    }
}

#[async_trait]
impl CompletionClient for TopicCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let topic = self
            .topics
            .iter()
            .find(|t| prompt.contains(*t))
            .ok_or_else(|| CompletionError::RequestFailed("unknown topic".to_string()))?;

        tokio::time::sleep(Duration::from_millis(5)).await;
        if prompt.starts_with(SYNTHESIS_HEADER) {
            Ok(Self::query_for(topic))
        } else if prompt.starts_with(REPAIR_HEADER) {
            Ok(review(&Self::query_for(topic), &[]))
        } else {
            Ok(format!("There is one {} node.", topic))
        }
    }
}

/// Store that returns one row whose identifier is derived from the label
/// matched in the query.
pub struct LabelStore;

#[async_trait]
impl GraphStore for LabelStore {
    async fn schema(&self) -> StoreResult<String> {
        Ok("(:Alpha), (:Beta)".to_string())
    }

    async fn query(&self, text: &str) -> StoreResult<QueryResult> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let label = text
            .split(|c: char| c == ':' || c == ')')
            .nth(1)
            .unwrap_or("none")
            .to_lowercase();
        Ok(json!([{ "_id": format!("{}-1", label) }]).into())
    }
}
