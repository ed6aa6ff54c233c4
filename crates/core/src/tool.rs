//! Tool trait and registry — the abstraction over agent capabilities.
//!
//! Tools are what let the agent act in the world: evaluate expressions,
//! search the web, query a retrieval service. Each tool declares a unique
//! name, a description, and a JSON Schema for its arguments; the registry
//! holds them and executes invocation requests from the agent loop.

use crate::error::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A request to execute a tool, as decided by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to execute.
    pub name: String,

    /// Arguments as a JSON value (normally an object).
    pub arguments: serde_json::Value,
}

/// The result of a successful tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text fed back to the model as the Observation.
    pub content: String,

    /// Optional structured payload for programmatic callers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolOutput {
    /// A plain text output with no structured payload.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            data: None,
        }
    }
}

/// The descriptor advertised to the model for one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique name within the registry.
    pub name: String,

    /// What the tool does — shown to the model verbatim.
    pub description: String,

    /// JSON Schema for the tool's arguments.
    pub parameters: serde_json::Value,
}

/// The core Tool trait.
///
/// Implementations must be pure functions of their arguments as far as the
/// loop is concerned: side effects (network, filesystem) are the tool's
/// own responsibility to sandbox and rate-limit.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g. "calculator").
    fn name(&self) -> &str;

    /// A description of what this tool does (rendered into the prompt).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value)
        -> std::result::Result<ToolOutput, ToolError>;

    /// The descriptor for this tool.
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// The agent loop uses this to render the tool catalogue into the prompt
/// and to execute the model's tool requests. Shared behind an `Arc`; the
/// map is immutable after construction, so concurrent invocation is safe.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Fails with `ToolError::Duplicate` if a tool with
    /// the same name is already registered.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> std::result::Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Descriptors for all registered tools.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|t| t.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Sorted names of all registered tools.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Execute a tool call. Fails with `ToolError::NotFound` for unknown
    /// names; execution failures come back from the tool itself.
    pub async fn invoke(&self, call: &ToolCall) -> std::result::Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        tool.execute(call.arguments.clone()).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
