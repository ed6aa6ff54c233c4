//! Web search tool — offline stub returning deterministic results.
//!
//! In production this would call a real search API (SerpApi, Brave, etc.).
//! The stub produces plausible numbered snippets so the agent loop can be
//! exercised end-to-end without network access or API keys.

use async_trait::async_trait;
use reagent_core::error::ToolError;
use reagent_core::tool::{Tool, ToolOutput};
use serde::Serialize;

pub struct WebSearchTool;

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Use this for recent events and facts outside your knowledge. Returns numbered snippets."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of results to return (default 3, max 5)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'query' argument".into()))?;
        if query.trim().is_empty() {
            return Err(ToolError::InvalidArguments("'query' must not be empty".into()));
        }

        let num_results = arguments["num_results"].as_u64().unwrap_or(3).clamp(1, 5) as usize;

        let hits = mock_hits(query, num_results);

        // Numbered snippet blocks, like a search API's organic results.
        let content = hits
            .iter()
            .enumerate()
            .map(|(i, h)| format!("[{}] {}\n{}", i + 1, h.title, h.snippet))
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(ToolOutput {
            content,
            data: serde_json::to_value(&hits).ok(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct SearchHit {
    title: String,
    url: String,
    snippet: String,
}

fn mock_hits(query: &str, count: usize) -> Vec<SearchHit> {
    let q = query.to_lowercase();

    if q.contains("rust") {
        let canned = [
            SearchHit {
                title: "The Rust Programming Language".into(),
                url: "https://doc.rust-lang.org/book/".into(),
                snippet: "Rust is a systems programming language focused on safety, speed, and concurrency.".into(),
            },
            SearchHit {
                title: "crates.io: Rust Package Registry".into(),
                url: "https://crates.io/".into(),
                snippet: "The Rust community's crate registry for sharing and discovering libraries.".into(),
            },
            SearchHit {
                title: "Rust by Example".into(),
                url: "https://doc.rust-lang.org/rust-by-example/".into(),
                snippet: "Runnable examples illustrating Rust concepts and standard library usage.".into(),
            },
        ];
        return canned.into_iter().take(count).collect();
    }

    (0..count)
        .map(|i| SearchHit {
            title: format!("Result {} for: {}", i + 1, query),
            url: format!("https://example.com/search?q={}&p={}", query.replace(' ', "+"), i + 1),
            snippet: format!("Stub search result for '{query}'."),
        })
        .collect()
}
