//! Reagent Agent — the ReAct reasoning loop.
//!
//! Drives Thought, Action, Observation cycles against a `Provider` and a
//! `ToolRegistry` until the model produces a final answer or a budget
//! runs out. The raw model text is parsed strictly; the loop only ever
//! operates on typed steps. A second paradigm, the draft/critique/revise
//! reflection loop, lives in [`reflect`].

pub mod client;
pub mod parse;
pub mod prompt;
pub mod reflect;
pub mod runner;
pub mod stream_event;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use client::{StepClient, StepError};
pub use parse::{parse_step, NextStep, ParseError};
pub use reflect::{ReflectionLoop, ReflectionReport, ReflectionStep};
pub use runner::{AgentLoop, FailureReason, Outcome, RunReport};
pub use stream_event::StepEvent;
