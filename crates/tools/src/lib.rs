//! Built-in tool implementations for Reagent.
//!
//! Tools give the agent the ability to act: do math, search the web, and
//! query an external knowledge base. All implement the
//! `reagent_core::Tool` trait and are wired into a `ToolRegistry`.

pub mod calculator;
pub mod retrieval;
pub mod web_search;

pub use calculator::CalculatorTool;
pub use retrieval::RetrievalTool;
pub use web_search::WebSearchTool;

use reagent_core::error::ToolError;
use reagent_core::tool::ToolRegistry;

/// Create a registry with the default built-in tools.
///
/// When `retrieval_url` is set, the knowledge_search tool is registered
/// against that endpoint as well.
pub fn default_registry(
    retrieval_url: Option<&str>,
    retrieval_top_k: u32,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(CalculatorTool))?;
    registry.register(Box::new(WebSearchTool))?;
    if let Some(url) = retrieval_url {
        registry.register(Box::new(RetrievalTool::new(url, retrieval_top_k)?))?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_without_retrieval() {
        let registry = default_registry(None, 3).unwrap();
        assert_eq!(registry.names(), vec!["calculator", "web_search"]);
    }

    #[test]
    fn default_registry_with_retrieval() {
        let registry = default_registry(Some("http://localhost:9200/search"), 3).unwrap();
        assert_eq!(
            registry.names(),
            vec!["calculator", "knowledge_search", "web_search"]
        );
    }
}
