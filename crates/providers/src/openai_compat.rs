//! OpenAI-compatible provider implementation.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM, and any other endpoint
//! that speaks the `/v1/chat/completions` protocol. The agent drives the
//! model through plain text (the ReAct grammar is parsed upstream), so
//! only non-streaming chat completions are needed here.

use async_trait::async_trait;
use reagent_config::AppConfig;
use reagent_core::error::ProviderError;
use reagent_core::provider::{Completion, CompletionRequest, Provider, Usage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible LLM provider.
#[derive(Debug)]
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new provider against any OpenAI-compatible endpoint.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Build a provider from application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ProviderError::NotConfigured("api_key is not set (REAGENT_API_KEY)".into())
        })?;
        Self::new("openai", config.api_url.clone(), api_key)
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Create an Ollama provider (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Result<Self, ProviderError> {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    fn build_body(request: &CompletionRequest) -> serde_json::Value {
        let messages = vec![
            ApiMessage {
                role: "system".into(),
                content: request.system_prompt.clone(),
            },
            ApiMessage {
                role: "user".into(),
                content: request.user_prompt.clone(),
            },
        ];

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if !request.stop.is_empty() {
            body["stop"] = serde_json::json!(request.stop);
        }

        body
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<Completion, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(&request);

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited { retry_after_secs: 5 });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            model: api_response.model,
            usage,
        })
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o-mini".into(),
            system_prompt: "You are a ReAct agent".into(),
            user_prompt: "Task: what is 2+2?".into(),
            temperature: 0.2,
            max_tokens: Some(512),
            stop: vec!["Observation:".into()],
        }
    }

    #[test]
    fn openai_constructor() {
        let provider = OpenAiCompatProvider::openai("sk-test").unwrap();
        assert_eq!(provider.name(), "openai");
        assert!(provider.base_url.contains("api.openai.com"));
    }

    #[test]
    fn ollama_constructor() {
        let provider = OpenAiCompatProvider::ollama(None).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert!(provider.base_url.contains("localhost:11434"));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let provider =
            OpenAiCompatProvider::new("custom", "http://localhost:8000/v1/", "key").unwrap();
        assert_eq!(provider.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn from_config_requires_api_key() {
        let config = AppConfig::default();
        let err = OpenAiCompatProvider::from_config(&config).unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn body_contains_system_and_user_messages() {
        let body = OpenAiCompatProvider::build_body(&request());
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are a ReAct agent");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["stop"][0], "Observation:");
    }

    #[test]
    fn body_omits_unset_fields() {
        let mut req = request();
        req.max_tokens = None;
        req.stop = vec![];
        let body = OpenAiCompatProvider::build_body(&req);
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("stop").is_none());
    }

    #[test]
    fn parse_api_response() {
        let data = r#"{
            "model": "gpt-4o-mini",
            "choices": [
                {"message": {"role": "assistant", "content": "Final Answer: 4"}}
            ],
            "usage": {"prompt_tokens": 40, "completion_tokens": 6, "total_tokens": 46}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Final Answer: 4")
        );
        assert_eq!(parsed.usage.as_ref().unwrap().total_tokens, 46);
    }

    #[test]
    fn parse_api_response_null_content() {
        let data = r#"{"model": "m", "choices": [{"message": {"content": null}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
