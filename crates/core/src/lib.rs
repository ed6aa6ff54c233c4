//! # Reagent Core
//!
//! Domain types, traits, and error definitions for the Reagent ReAct agent
//! runtime. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted/mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod provider;
pub mod task;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use provider::{Completion, CompletionRequest, Provider, Usage};
pub use task::{InvariantViolation, Step, Task, TaskId, Transcript};
pub use tool::{Tool, ToolCall, ToolOutput, ToolRegistry, ToolSpec};
