//! Shared test doubles for agent loop tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reagent_core::error::ProviderError;
use reagent_core::provider::{Completion, CompletionRequest, Provider};

/// A provider that replays a fixed script of completions (or errors), one
/// per call. Panics if called more times than the script allows.
pub(crate) struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
}

impl ScriptedProvider {
    pub(crate) fn new(completions: Vec<&str>) -> Self {
        Self {
            script: Mutex::new(completions.into_iter().map(|s| Ok(s.to_string())).collect()),
        }
    }

    pub(crate) fn single(completion: &str) -> Self {
        Self::new(vec![completion])
    }

    pub(crate) fn failing(error: ProviderError) -> Self {
        Self {
            script: Mutex::new(VecDeque::from([Err(error)])),
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<Completion, ProviderError> {
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted provider called more times than expected");
        next.map(|text| Completion {
            text,
            model: request.model,
            usage: None,
        })
    }
}

/// A provider whose `complete` never resolves. For timeout and
/// cancellation tests under paused time.
pub(crate) struct PendingProvider;

#[async_trait]
impl Provider for PendingProvider {
    fn name(&self) -> &str {
        "pending"
    }

    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<Completion, ProviderError> {
        std::future::pending().await
    }
}

/// Build a grammar-conformant Action response.
pub(crate) fn action_text(thought: &str, tool: &str, args_json: &str) -> String {
    format!("Thought: {thought}\nAction: {tool}\nAction Input: {args_json}")
}

/// Build a grammar-conformant Final Answer response.
pub(crate) fn final_text(thought: &str, answer: &str) -> String {
    format!("Thought: {thought}\nFinal Answer: {answer}")
}
