//! Query validation and repair via the completion service
//!
//! One call reviews the candidate against the schema and the known errors
//! and returns a replacement candidate. The repairer is stateless; retry
//! state belongs to whichever loop is driving it.

use super::prompts;
use super::synthesize::strip_code_fences;
use crate::completion::{CompletionClient, CompletionError};
use crate::query::{Candidate, ErrorList};
use serde_json::{Deserializer, Map, Value};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RepairError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("no usable repair in completion response: {0}")]
    Unparseable(String),
}

pub struct QueryRepairer {
    client: Arc<dyn CompletionClient>,
    id_field: String,
}

impl QueryRepairer {
    pub fn new(client: Arc<dyn CompletionClient>, id_field: impl Into<String>) -> Self {
        Self {
            client,
            id_field: id_field.into(),
        }
    }

    /// Review `query` given `errors` and produce the next candidate.
    ///
    /// An unchecked error list asks for validation from scratch. The
    /// returned candidate always carries a checked error list.
    pub async fn repair(
        &self,
        question: &str,
        schema: &str,
        query: &str,
        errors: &ErrorList,
    ) -> Result<Candidate, RepairError> {
        let error_text = render_errors(errors);
        let prompt = prompts::render(
            prompts::REPAIR,
            &[
                ("id_field", self.id_field.as_str()),
                ("errors", error_text.as_str()),
                ("schema", schema),
                ("question", question),
                ("cypher", query),
            ],
        );

        let response = self.client.complete(&prompt).await?;
        parse_repair(&response)
    }
}

fn render_errors(errors: &ErrorList) -> String {
    match errors {
        ErrorList::Checked(list) if list.is_empty() => "None".to_string(),
        _ => errors
            .lines()
            .iter()
            .map(|line| format!("- {}", line))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Read `{"cypher": ..., "errors": [...]}` out of a model response.
///
/// `query` is accepted in place of `cypher`; a missing `errors` key means
/// the model found nothing wrong.
fn parse_repair(response: &str) -> Result<Candidate, RepairError> {
    let parsed = repair_object(response).ok_or_else(|| {
        RepairError::Unparseable(format!(
            "no repair object found: {}",
            response.chars().take(200).collect::<String>()
        ))
    })?;

    let query = parsed
        .get("cypher")
        .or_else(|| parsed.get("query"))
        .and_then(Value::as_str)
        .map(strip_code_fences)
        .unwrap_or_default();
    if query.is_empty() {
        return Err(RepairError::Unparseable("response has no cypher".to_string()));
    }

    let errors = match parsed.get("errors") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if s.trim().is_empty() => None,
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    };

    Ok(Candidate::new(query, ErrorList::Checked(errors)))
}

/// First JSON object in `response` that names a query.
///
/// Models wrap the object in fences or prose, and the prose may itself
/// contain braces, so every `{` is tried as the start of an object.
fn repair_object(response: &str) -> Option<Map<String, Value>> {
    response
        .match_indices('{')
        .filter_map(|(start, _)| leading_object(&response[start..]))
        .find(|object| object.contains_key("cypher") || object.contains_key("query"))
}

/// The object at the very start of `text`, ignoring whatever follows it.
fn leading_object(text: &str) -> Option<Map<String, Value>> {
    match Deserializer::from_str(text).into_iter::<Value>().next() {
        Some(Ok(Value::Object(object))) => Some(object),
        _ => None,
    }
}
