//! Final answer synthesis and provenance stripping
//!
//! The prompt asks the model not to mention where its facts came from, but
//! models ignore that often enough that the denylist filter runs over every
//! answer regardless.

use super::prompts;
use crate::completion::{CompletionClient, CompletionError};
use regex_lite::Regex;
use std::sync::Arc;
use tracing::debug;

/// Context handed to the model when the query produced nothing usable.
pub const MISSING_CONTEXT: &str = "I don't know";

/// Returned when the completion service can't produce an answer at all.
pub const FALLBACK_ANSWER: &str = "I'm sorry, I wasn't able to find an answer to that question \
right now. Could you try rephrasing it?";

/// Removes source-revealing vocabulary from generated text.
///
/// Terms match whole words, case-insensitively; multi-word terms match
/// across any run of whitespace. Matches are replaced with nothing and the
/// surrounding text is left exactly as it was.
#[derive(Debug, Clone)]
pub struct ProvenanceFilter {
    pattern: Option<Regex>,
}

impl ProvenanceFilter {
    /// Build the filter for `terms`.
    ///
    /// Terms are escaped, so this only fails when the combined pattern
    /// exceeds the regex engine's size limits.
    pub fn new<I, S>(terms: I) -> Result<Self, regex_lite::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut alternatives: Vec<String> = terms
            .into_iter()
            .map(|term| {
                term.as_ref()
                    .split_whitespace()
                    .map(regex_lite::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+")
            })
            .filter(|alt| !alt.is_empty())
            .collect();
        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }
        // Longest first so "available information" wins over any shorter overlap.
        alternatives.sort_by_key(|alt| std::cmp::Reverse(alt.len()));

        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Remove every denylisted term.
    ///
    /// Removing one term can close the gap between the words around it and
    /// form another ("available database information"), so passes repeat
    /// until nothing matches. Each pass that changes the text shortens it.
    pub fn strip(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };
        let mut out = text.to_string();
        while pattern.is_match(&out) {
            out = pattern.replace_all(&out, "").into_owned();
        }
        out
    }
}

/// Whether a context string carries no information.
pub(crate) fn is_missing(context: Option<&str>) -> bool {
    match context.map(str::trim) {
        None => true,
        Some(text) => matches!(text, "" | "[]" | "{}" | "null"),
    }
}

/// Turns a question plus serialized results into a stripped answer.
pub struct AnswerSynthesizer {
    client: Arc<dyn CompletionClient>,
    filter: ProvenanceFilter,
}

impl AnswerSynthesizer {
    pub fn new(client: Arc<dyn CompletionClient>, filter: ProvenanceFilter) -> Self {
        Self { client, filter }
    }

    /// Answer `question` from `context`, or admit not knowing when there is none.
    pub async fn synthesize_answer(
        &self,
        question: &str,
        context: Option<&str>,
    ) -> Result<String, CompletionError> {
        let context = match context {
            Some(text) if !is_missing(Some(text)) => text,
            _ => {
                debug!("no usable context, asking for an honest don't-know");
                MISSING_CONTEXT
            }
        };
        let prompt = prompts::render(
            prompts::ANSWER,
            &[("question", question), ("context", context)],
        );

        let raw = self.client.complete(&prompt).await?;
        Ok(self.filter.strip(raw.trim()))
    }

    /// The fixed answer used when synthesis itself fails.
    pub fn fallback(&self) -> String {
        self.filter.strip(FALLBACK_ANSWER)
    }
}
