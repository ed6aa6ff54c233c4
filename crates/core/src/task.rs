//! Task, Step, and Transcript — the reasoning record for one agent run.
//!
//! A `Task` is the immutable input. The `Transcript` is the ordered,
//! append-only sequence of `Step`s produced while solving it. The agent
//! loop owns the transcript by value (the write view); every other
//! component borrows it immutably (the read view).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The immutable input to one agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID.
    pub id: TaskId,

    /// What the caller wants done.
    pub goal: String,

    /// Optional extra context supplied by the caller (e.g. prior session
    /// history rendered by an external memory store).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// When the task was created.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task from a goal string.
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            goal: goal.into(),
            context: None,
            created_at: Utc::now(),
        }
    }

    /// Attach caller-supplied context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// One entry in the reasoning record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// A reasoning step from the model.
    Thought { content: String },

    /// A tool invocation requested by the model.
    Action {
        tool_name: String,
        arguments: serde_json::Value,
    },

    /// The result of executing the immediately preceding Action.
    /// `is_error` marks observations carrying failure text instead of a
    /// result, so the model can self-correct.
    Observation { content: String, is_error: bool },

    /// The model's final answer. Always the last step when present.
    FinalAnswer { content: String },
}

/// A violation of the transcript ordering invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("Action at index {0} is not followed by an Observation")]
    ActionWithoutObservation(usize),

    #[error("Observation at index {0} is not preceded by an Action")]
    ObservationWithoutAction(usize),

    #[error("FinalAnswer at index {0} is not the last step")]
    StepAfterFinalAnswer(usize),
}

/// The ordered, append-only reasoning record for one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// The task being solved.
    pub task: Task,

    /// Ordered steps. Append-only during a run.
    steps: Vec<Step>,

    /// When the transcript was created.
    pub created_at: DateTime<Utc>,

    /// When the last step was appended.
    pub updated_at: DateTime<Utc>,
}

impl Transcript {
    /// Start a fresh transcript for a task.
    pub fn new(task: Task) -> Self {
        let now = Utc::now();
        Self {
            task,
            steps: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Read view of the steps.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps recorded so far.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether a FinalAnswer has been recorded.
    pub fn is_closed(&self) -> bool {
        matches!(self.steps.last(), Some(Step::FinalAnswer { .. }))
    }

    /// The final answer text, if the transcript is closed.
    pub fn final_answer(&self) -> Option<&str> {
        match self.steps.last() {
            Some(Step::FinalAnswer { content }) => Some(content),
            _ => None,
        }
    }

    // -- Write view (used by the agent loop, which owns the transcript) --

    pub fn push_thought(&mut self, content: impl Into<String>) {
        self.push(Step::Thought {
            content: content.into(),
        });
    }

    pub fn push_action(&mut self, tool_name: impl Into<String>, arguments: serde_json::Value) {
        self.push(Step::Action {
            tool_name: tool_name.into(),
            arguments,
        });
    }

    pub fn push_observation(&mut self, content: impl Into<String>) {
        self.push(Step::Observation {
            content: content.into(),
            is_error: false,
        });
    }

    pub fn push_error_observation(&mut self, content: impl Into<String>) {
        self.push(Step::Observation {
            content: content.into(),
            is_error: true,
        });
    }

    pub fn push_final_answer(&mut self, content: impl Into<String>) {
        self.push(Step::FinalAnswer {
            content: content.into(),
        });
    }

    fn push(&mut self, step: Step) {
        self.updated_at = Utc::now();
        self.steps.push(step);
    }

    /// Check the causal-order invariants:
    ///
    /// - every Action is immediately followed by exactly one Observation,
    /// - every Observation is the direct result of the preceding Action,
    /// - a FinalAnswer, when present, is the last step.
    pub fn validate(&self) -> std::result::Result<(), InvariantViolation> {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                Step::Action { .. } => match self.steps.get(i + 1) {
                    Some(Step::Observation { .. }) => {}
                    _ => return Err(InvariantViolation::ActionWithoutObservation(i)),
                },
                Step::Observation { .. } => match i.checked_sub(1).map(|p| &self.steps[p]) {
                    Some(Step::Action { .. }) => {}
                    _ => return Err(InvariantViolation::ObservationWithoutAction(i)),
                },
                Step::FinalAnswer { .. } => {
                    if i + 1 != self.steps.len() {
                        return Err(InvariantViolation::StepAfterFinalAnswer(i));
                    }
                }
                Step::Thought { .. } => {}
            }
        }
        Ok(())
    }

    /// Render the reasoning history as text for the model prompt.
    ///
    /// Uses the same line-leading markers the response grammar expects, so
    /// the model sees its own prior output verbatim.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            match step {
                Step::Thought { content } => {
                    out.push_str("Thought: ");
                    out.push_str(content);
                    out.push('\n');
                }
                Step::Action {
                    tool_name,
                    arguments,
                } => {
                    out.push_str("Action: ");
                    out.push_str(tool_name);
                    out.push('\n');
                    out.push_str("Action Input: ");
                    out.push_str(&arguments.to_string());
                    out.push('\n');
                }
                Step::Observation { content, .. } => {
                    out.push_str("Observation: ");
                    out.push_str(content);
                    out.push('\n');
                }
                Step::FinalAnswer { content } => {
                    out.push_str("Final Answer: ");
                    out.push_str(content);
                    out.push('\n');
                }
            }
        }
        out
    }
}
