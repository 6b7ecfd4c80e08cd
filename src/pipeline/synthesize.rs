//! Initial query synthesis from a question and the store schema

use super::prompts;
use crate::completion::{CompletionClient, CompletionError};
use std::sync::Arc;
use tracing::debug;

/// Turns a question into a first candidate query.
///
/// Failures propagate unchanged; retrying is the caller's business.
pub struct QuerySynthesizer {
    client: Arc<dyn CompletionClient>,
    id_field: String,
    result_limit: usize,
}

impl QuerySynthesizer {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        id_field: impl Into<String>,
        result_limit: usize,
    ) -> Self {
        Self {
            client,
            id_field: id_field.into(),
            result_limit,
        }
    }

    pub async fn synthesize(
        &self,
        question: &str,
        schema: &str,
    ) -> Result<String, CompletionError> {
        let limit = self.result_limit.to_string();
        let prompt = prompts::render(
            prompts::SYNTHESIS,
            &[
                ("id_field", self.id_field.as_str()),
                ("limit", limit.as_str()),
                ("schema", schema),
                ("question", question),
            ],
        );

        let text = self.client.complete(&prompt).await?;
        let query = strip_code_fences(&text);
        if query.is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        debug!(query = %query, "synthesized candidate query");
        Ok(query)
    }
}

/// Drop a Markdown code fence (```cypher ... ```) around generated Cypher.
pub(crate) fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Skip the info string (`cypher`, `sql`, ...) on the opening line.
    let body = match body.find('\n') {
        Some(newline) => &body[newline + 1..],
        None => body,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}
