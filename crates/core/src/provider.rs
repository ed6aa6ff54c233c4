//! Provider trait — the abstraction over LLM backends.
//!
//! A Provider turns a rendered prompt into a text completion. The agent
//! never talks to a provider directly; the language-model client in
//! `reagent-agent` renders the transcript, calls `complete()`, and parses
//! the raw text into a step. Keeping the trait text-only means any backend
//! with a chat-completions endpoint can drive the loop.

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A rendered completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g. "gpt-4o-mini", "qwen2.5:7b").
    pub model: String,

    /// System prompt: role, tool catalogue, and response grammar.
    pub system_prompt: String,

    /// User prompt: the task plus the rendered transcript so far.
    pub user_prompt: String,

    /// Temperature (0.0 = deterministic, 1.0 = creative).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Stop sequences. The loop stops generation at "Observation:" so the
    /// model cannot hallucinate tool results.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

fn default_temperature() -> f32 {
    0.7
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// The raw generated text.
    pub text: String,

    /// Which model actually responded (may differ from requested).
    pub model: String,

    /// Token usage statistics, when the backend reports them.
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// Implementations must be safe for concurrent use: multiple agent loops
/// share one provider instance behind an `Arc`.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g. "openai", "ollama").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<Completion, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialization_skips_empty_fields() {
        let req = CompletionRequest {
            model: "gpt-4o-mini".into(),
            system_prompt: "You are an agent".into(),
            user_prompt: "Task: hello".into(),
            temperature: 0.7,
            max_tokens: None,
            stop: vec![],
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("max_tokens"));
        assert!(!json.contains("stop"));
    }

    #[test]
    fn request_default_temperature() {
        let json = r#"{
            "model": "m",
            "system_prompt": "s",
            "user_prompt": "u"
        }"#;
        let req: CompletionRequest = serde_json::from_str(json).unwrap();
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert!(req.stop.is_empty());
    }

    #[test]
    fn completion_roundtrip() {
        let c = Completion {
            text: "Final Answer: 84".into(),
            model: "gpt-4o-mini".into(),
            usage: Some(Usage {
                prompt_tokens: 120,
                completion_tokens: 8,
                total_tokens: 128,
            }),
        };
        let json = serde_json::to_string(&c).unwrap();
        let back: Completion = serde_json::from_str(&json).unwrap();
        assert_eq!(back.text, "Final Answer: 84");
        assert_eq!(back.usage.unwrap().total_tokens, 128);
    }
}
