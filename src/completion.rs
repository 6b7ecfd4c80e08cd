//! Completion service client for the generative text backend
//!
//! Defines the client trait the pipeline prompts for queries, repairs and
//! answers. Two implementations:
//! - `CommandCompletion`: pipes the prompt to an external command (production)
//! - `MockCompletion`: replays scripted responses (testing)
//!
//! Clients are shared across concurrent questions and must not carry
//! per-question state.

use crate::process::{run_piped, split_command_line};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Errors from completion service calls.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion service not available: {0}")]
    Unavailable(String),
    #[error("completion request failed: {0}")]
    RequestFailed(String),
    #[error("completion service returned an empty response")]
    EmptyResponse,
}

/// Client trait for a generative completion service.
///
/// Abstracts over transport (subprocess, HTTP, mock) so the pipeline
/// doesn't depend on how the model is reached.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete `prompt`, returning the raw generated text.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Completion client backed by an external command.
///
/// The prompt is written to the command's stdin; whatever it prints on
/// stdout is the completion. Works with any CLI that follows that
/// convention (`llm`, `ollama run <model>`, a wrapper script...).
#[derive(Debug, Clone)]
pub struct CommandCompletion {
    program: String,
    args: Vec<String>,
}

impl CommandCompletion {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Build from a whitespace-separated command line, e.g. `"ollama run llama3"`.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let (program, args) = split_command_line(line)?;
        Some(Self { program, args })
    }
}

#[async_trait]
impl CompletionClient for CommandCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let output = run_piped(&self.program, &self.args, prompt)
            .await
            .map_err(|e| CompletionError::Unavailable(format!("{}: {}", self.program, e)))?;

        if !output.success {
            return Err(CompletionError::RequestFailed(output.failure_message()));
        }
        if output.stdout.trim().is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        Ok(output.stdout)
    }
}

/// Mock client for testing. Replays preconfigured responses.
///
/// Resolution order for each call:
/// 1. the next scripted entry, if any remain
/// 2. the first routed response whose marker occurs in the prompt
/// 3. the fallback response
/// 4. `CompletionError::Unavailable`
#[derive(Default)]
pub struct MockCompletion {
    script: Mutex<VecDeque<Result<String, String>>>,
    routes: Vec<(String, String)>,
    fallback: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn respond(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()))
    }

    /// Queue a failed call.
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()))
    }

    /// Answer any prompt containing `marker` with `text` once the script is spent.
    pub fn route(mut self, marker: impl Into<String>, text: impl Into<String>) -> Self {
        self.routes.push((marker.into(), text.into()));
        self
    }

    /// Respond with `text` whenever nothing else matches.
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    /// Every prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Number of prompts containing `marker`.
    pub fn count_containing(&self, marker: &str) -> usize {
        self.prompts().iter().filter(|p| p.contains(marker)).count()
    }

    pub fn call_count(&self) -> usize {
        self.prompts().len()
    }

    fn push(self, entry: Result<String, String>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(entry);
        }
        self
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        if let Some(entry) = scripted {
            return entry.map_err(CompletionError::RequestFailed);
        }

        if let Some((_, text)) = self.routes.iter().find(|(m, _)| prompt.contains(m.as_str())) {
            return Ok(text.clone());
        }

        self.fallback
            .clone()
            .ok_or_else(|| CompletionError::Unavailable("mock script exhausted".to_string()))
    }
}
