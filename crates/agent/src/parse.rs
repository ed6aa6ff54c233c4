//! Strict parser for raw model output.
//!
//! The model replies in the ReAct grammar:
//!
//! ```text
//! Thought: <free text>
//! Action: <tool_name>
//! Action Input: <JSON object>
//! ```
//!
//! or
//!
//! ```text
//! Thought: <free text>
//! Final Answer: <free text>
//! ```
//!
//! The parser produces a tagged [`NextStep`] or a [`ParseError`] — there is
//! no loose pattern-matching at call sites. Anything outside the grammar
//! (no marker, both Action and Final Answer, unparseable Action Input) is
//! malformed and handled by the loop's retry budget.

use reagent_core::tool::ToolCall;
use thiserror::Error;

/// The model's decision for the next step of the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum NextStep {
    /// Reasoning only — the loop records it and asks again.
    Thought(String),

    /// A tool invocation request.
    Action {
        thought: Option<String>,
        call: ToolCall,
    },

    /// The final answer — terminates the loop.
    FinalAnswer {
        thought: Option<String>,
        answer: String,
    },
}

/// The model's output did not match the response grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed model response: {0}")]
pub struct ParseError(pub String);

impl ParseError {
    fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Which block continuation lines belong to.
#[derive(Clone, Copy, PartialEq)]
enum Block {
    None,
    Thought,
    ActionInput,
    FinalAnswer,
}

/// Parse one raw completion into a [`NextStep`].
pub fn parse_step(raw: &str) -> Result<NextStep, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::new("empty response"));
    }

    let mut thought: Option<String> = None;
    let mut action_name: Option<String> = None;
    let mut action_input: Option<String> = None;
    let mut final_answer: Option<String> = None;
    let mut block = Block::None;

    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix("Thought:") {
            append(&mut thought, rest.trim());
            block = Block::Thought;
        } else if let Some(rest) = line.strip_prefix("Final Answer:") {
            if action_name.is_some() {
                return Err(ParseError::new("both Action and Final Answer present"));
            }
            append(&mut final_answer, rest.trim());
            block = Block::FinalAnswer;
        } else if let Some(rest) = line.strip_prefix("Action Input:") {
            if action_name.is_none() {
                return Err(ParseError::new("Action Input without a preceding Action"));
            }
            append(&mut action_input, rest.trim());
            block = Block::ActionInput;
        } else if let Some(rest) = line.strip_prefix("Action:") {
            if final_answer.is_some() {
                return Err(ParseError::new("both Action and Final Answer present"));
            }
            if action_name.is_some() {
                return Err(ParseError::new("multiple Action markers"));
            }
            let name = rest.trim();
            if name.is_empty() {
                return Err(ParseError::new("Action with empty tool name"));
            }
            action_name = Some(name.to_string());
            block = Block::None;
        } else {
            // Continuation line of the current block.
            match block {
                Block::Thought => append(&mut thought, line.trim_end()),
                Block::ActionInput => append(&mut action_input, line.trim()),
                Block::FinalAnswer => append(&mut final_answer, line.trim_end()),
                Block::None => {
                    if !line.trim().is_empty() {
                        return Err(ParseError::new(format!(
                            "unrecognized line outside any block: {:?}",
                            line.trim()
                        )));
                    }
                }
            }
        }
    }

    let thought = thought.filter(|t| !t.is_empty());

    if let Some(answer) = final_answer {
        if answer.is_empty() {
            return Err(ParseError::new("Final Answer with empty content"));
        }
        return Ok(NextStep::FinalAnswer { thought, answer });
    }

    if let Some(name) = action_name {
        let input = action_input
            .filter(|i| !i.is_empty())
            .ok_or_else(|| ParseError::new("Action without Action Input"))?;
        let arguments: serde_json::Value = serde_json::from_str(&input)
            .map_err(|e| ParseError::new(format!("Action Input is not valid JSON: {e}")))?;
        if !arguments.is_object() {
            return Err(ParseError::new("Action Input must be a JSON object"));
        }
        return Ok(NextStep::Action {
            thought,
            call: ToolCall { name, arguments },
        });
    }

    match thought {
        Some(t) => Ok(NextStep::Thought(t)),
        None => Err(ParseError::new("no recognized step marker")),
    }
}

fn append(slot: &mut Option<String>, text: &str) {
    match slot {
        Some(existing) => {
            if !text.is_empty() {
                if !existing.is_empty() {
                    existing.push('\n');
                }
                existing.push_str(text);
            }
        }
        None => *slot = Some(text.to_string()),
    }
}
