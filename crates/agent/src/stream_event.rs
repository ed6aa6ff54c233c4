//! Events emitted while an agent run is in progress.
//!
//! `run_stream` sends these over a channel as each step lands, so callers
//! can show progress live instead of waiting for the final report.

use serde::{Deserialize, Serialize};

use crate::runner::FailureReason;

/// One progress event from a streaming agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepEvent {
    /// The model produced a reasoning step.
    Thought { content: String },

    /// The model requested a tool invocation.
    Action {
        tool_name: String,
        arguments: serde_json::Value,
    },

    /// A tool finished (or failed) and its result was recorded.
    Observation { content: String, is_error: bool },

    /// The run finished with a final answer.
    Done {
        answer: String,
        steps_used: u32,
        tool_calls_made: u32,
    },

    /// The run terminated without an answer.
    Failed {
        reason: FailureReason,
        steps_used: u32,
    },
}

impl StepEvent {
    /// The serialized tag for this event, for logging.
    pub fn event_type(&self) -> &'static str {
        match self {
            StepEvent::Thought { .. } => "thought",
            StepEvent::Action { .. } => "action",
            StepEvent::Observation { .. } => "observation",
            StepEvent::Done { .. } => "done",
            StepEvent::Failed { .. } => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = StepEvent::Action {
            tool_name: "calculator".into(),
            arguments: serde_json::json!({"expression": "12*7"}),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"action""#));
        assert!(json.contains(r#""tool_name":"calculator""#));
    }

    #[test]
    fn done_event_carries_counters() {
        let event = StepEvent::Done {
            answer: "84".into(),
            steps_used: 3,
            tool_calls_made: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "done");
        assert_eq!(json["steps_used"], 3);
    }

    #[test]
    fn failed_event_roundtrip() {
        let event = StepEvent::Failed {
            reason: FailureReason::StepBudgetExceeded,
            steps_used: 8,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: StepEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_type(), "failed");
    }
}
