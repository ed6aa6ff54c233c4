//! Knowledge retrieval tool — client for an external retrieval service.
//!
//! The retrieval pipeline itself (ingestion, embeddings, vector store) is
//! an external collaborator; this tool exposes it to the model with a
//! search-like contract: query string in, ranked snippets out.
//!
//! Expected endpoint protocol: `POST <url>` with `{"query": ..., "top_k": ...}`,
//! responding `{"snippets": [{"content": ..., "score": ..., "source": ...}]}`.

use async_trait::async_trait;
use reagent_core::error::ToolError;
use reagent_core::tool::{Tool, ToolOutput};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct RetrievalTool {
    endpoint: String,
    top_k: u32,
    client: reqwest::Client,
}

impl RetrievalTool {
    pub fn new(endpoint: impl Into<String>, top_k: u32) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ToolError::execution("knowledge_search", format!("HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.into(),
            top_k: top_k.max(1),
            client,
        })
    }

    fn build_body(&self, query: &str) -> QueryBody {
        QueryBody {
            query: query.to_string(),
            top_k: self.top_k,
        }
    }
}

#[async_trait]
impl Tool for RetrievalTool {
    fn name(&self) -> &str {
        "knowledge_search"
    }

    fn description(&self) -> &str {
        "Search the knowledge base for passages relevant to a query. Use this for domain questions before falling back to web search."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look up in the knowledge base"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'query' argument".into()))?;

        debug!(endpoint = %self.endpoint, query, "Querying retrieval service");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.build_body(query))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::Timeout {
                        tool_name: "knowledge_search".into(),
                        timeout_secs: 30,
                    }
                } else {
                    ToolError::execution("knowledge_search", e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::execution(
                "knowledge_search",
                format!("retrieval service returned HTTP {status}"),
            ));
        }

        let body: QueryResponse = response.json().await.map_err(|e| {
            ToolError::execution("knowledge_search", format!("invalid response: {e}"))
        })?;

        Ok(ToolOutput {
            content: format_snippets(&body.snippets),
            data: serde_json::to_value(&body.snippets).ok(),
        })
    }
}

#[derive(Debug, Serialize)]
struct QueryBody {
    query: String,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    snippets: Vec<Snippet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snippet {
    content: String,
    #[serde(default)]
    score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

fn format_snippets(snippets: &[Snippet]) -> String {
    if snippets.is_empty() {
        return "No relevant passages found.".into();
    }
    snippets
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let source = s.source.as_deref().unwrap_or("unknown");
            format!("[{}] (source: {}) {}", i + 1, source, s.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_query_and_top_k() {
        let tool = RetrievalTool::new("http://localhost:9200/search", 5).unwrap();
        let body = tool.build_body("polynomial equations");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["query"], "polynomial equations");
        assert_eq!(json["top_k"], 5);
    }

    #[test]
    fn top_k_floor_is_one() {
        let tool = RetrievalTool::new("http://localhost/search", 0).unwrap();
        assert_eq!(tool.top_k, 1);
    }

    #[test]
    fn format_empty_snippets() {
        assert_eq!(format_snippets(&[]), "No relevant passages found.");
    }

    #[test]
    fn format_ranked_snippets() {
        let snippets = vec![
            Snippet {
                content: "A quadratic has degree two.".into(),
                score: 0.92,
                source: Some("algebra.md".into()),
            },
            Snippet {
                content: "Roots come in conjugate pairs.".into(),
                score: 0.81,
                source: None,
            },
        ];
        let text = format_snippets(&snippets);
        assert!(text.starts_with("[1] (source: algebra.md)"));
        assert!(text.contains("[2] (source: unknown)"));
    }

    #[test]
    fn response_parsing_tolerates_missing_fields() {
        let body: QueryResponse =
            serde_json::from_str(r#"{"snippets": [{"content": "x"}]}"#).unwrap();
        assert_eq!(body.snippets.len(), 1);
        assert_eq!(body.snippets[0].score, 0.0);
        assert!(body.snippets[0].source.is_none());

        let empty: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.snippets.is_empty());
    }

    #[test]
    fn tool_spec() {
        let tool = RetrievalTool::new("http://localhost/search", 3).unwrap();
        assert_eq!(tool.spec().name, "knowledge_search");
    }
}
