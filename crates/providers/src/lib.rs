//! LLM provider implementations for Reagent.
//!
//! All providers implement the `reagent_core::Provider` trait. The agent
//! loop is provider-agnostic; anything that exposes an OpenAI-compatible
//! chat-completions endpoint can drive it.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
