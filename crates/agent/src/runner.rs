//! The agent loop — an explicit state machine over Thought, Action,
//! Observation cycles.
//!
//! Each iteration asks the model for its next step, executes any requested
//! tool, and feeds the observation back. The loop terminates on a final
//! answer, on an exhausted step budget, on repeated malformed output, or
//! on cancellation. Tool failures are recoverable: they become error
//! observations the model can react to. Provider failures are not: they
//! propagate to the caller with the run abandoned.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reagent_core::error::{Error, ToolError};
use reagent_core::tool::{ToolCall, ToolRegistry, ToolSpec};
use reagent_core::{Task, Transcript};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{StepClient, StepError};
use crate::parse::NextStep;
use crate::stream_event::StepEvent;

/// Why a run terminated without an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The step budget ran out before a final answer.
    StepBudgetExceeded,

    /// The model produced unparseable output past the retry budget.
    MalformedResponse,

    /// The caller cancelled the run.
    Cancelled,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::StepBudgetExceeded => write!(f, "step budget exceeded"),
            FailureReason::MalformedResponse => write!(f, "malformed model response"),
            FailureReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// The loop's control state.
#[derive(Debug, Clone, PartialEq)]
enum LoopState {
    /// Ready to ask the model for the next step.
    Running,

    /// A tool call has been recorded and awaits execution.
    AwaitingTool(ToolCall),

    /// Terminal: the model produced a final answer.
    Done(String),

    /// Terminal: the run failed.
    Failed(FailureReason),
}

/// How a run ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Done { answer: String },
    Failed { reason: FailureReason },
}

/// The full result of one agent run. The transcript is always present,
/// even for failed runs, so callers can inspect partial progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub outcome: Outcome,
    pub transcript: Transcript,
    pub steps_used: u32,
    pub tool_calls_made: u32,
}

impl RunReport {
    /// The final answer, if the run succeeded.
    pub fn answer(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Done { answer } => Some(answer),
            Outcome::Failed { .. } => None,
        }
    }
}

/// A configured, reusable agent loop. Cheap to clone; runs share the
/// provider and tool registry.
#[derive(Clone)]
pub struct AgentLoop {
    client: StepClient,
    tools: Arc<ToolRegistry>,
    max_steps: u32,
    max_parse_retries: u32,
    tool_timeout: Duration,
}

impl AgentLoop {
    pub fn new(client: StepClient, tools: Arc<ToolRegistry>) -> Self {
        Self {
            client,
            tools,
            max_steps: 8,
            max_parse_retries: 2,
            tool_timeout: Duration::from_secs(30),
        }
    }

    /// Maximum model calls per run. Must be at least 1.
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Retries allowed per step when the model output fails to parse.
    pub fn with_max_parse_retries(mut self, retries: u32) -> Self {
        self.max_parse_retries = retries;
        self
    }

    /// Deadline for a single tool execution.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Run a task to completion, returning the full report.
    pub async fn run(&self, task: Task, cancel: CancellationToken) -> Result<RunReport, Error> {
        self.drive(task, cancel, None).await
    }

    /// Run a task, streaming progress events as steps land.
    ///
    /// The receiver yields [`StepEvent`]s; the join handle resolves to the
    /// same [`RunReport`] that [`run`](Self::run) would return.
    pub fn run_stream(
        &self,
        task: Task,
        cancel: CancellationToken,
    ) -> (
        mpsc::Receiver<StepEvent>,
        tokio::task::JoinHandle<Result<RunReport, Error>>,
    ) {
        let (tx, rx) = mpsc::channel(32);
        let agent = self.clone();
        let handle = tokio::spawn(async move { agent.drive(task, cancel, Some(tx)).await });
        (rx, handle)
    }

    async fn drive(
        &self,
        task: Task,
        cancel: CancellationToken,
        events: Option<mpsc::Sender<StepEvent>>,
    ) -> Result<RunReport, Error> {
        info!(task_id = %task.id, goal = %task.goal, "Starting agent run");

        let mut ctx = RunCtx {
            agent: self,
            specs: self.tools.specs(),
            transcript: Transcript::new(task),
            steps_used: 0,
            tool_calls_made: 0,
            cancel,
            events,
        };

        let mut state = LoopState::Running;
        loop {
            state = match state {
                LoopState::Running => {
                    if ctx.cancel.is_cancelled() {
                        LoopState::Failed(FailureReason::Cancelled)
                    } else if ctx.steps_used >= self.max_steps {
                        warn!(max_steps = self.max_steps, "Step budget exceeded");
                        LoopState::Failed(FailureReason::StepBudgetExceeded)
                    } else {
                        ctx.advance().await?
                    }
                }
                LoopState::AwaitingTool(call) => ctx.execute_tool(call).await,
                LoopState::Done(answer) => {
                    info!(steps = ctx.steps_used, "Run finished with an answer");
                    ctx.emit(StepEvent::Done {
                        answer: answer.clone(),
                        steps_used: ctx.steps_used,
                        tool_calls_made: ctx.tool_calls_made,
                    })
                    .await;
                    return Ok(ctx.report(Outcome::Done { answer }));
                }
                LoopState::Failed(reason) => {
                    warn!(%reason, steps = ctx.steps_used, "Run failed");
                    ctx.emit(StepEvent::Failed {
                        reason,
                        steps_used: ctx.steps_used,
                    })
                    .await;
                    return Ok(ctx.report(Outcome::Failed { reason }));
                }
            };
        }
    }
}

/// Mutable state for one run in progress.
struct RunCtx<'a> {
    agent: &'a AgentLoop,
    specs: Vec<ToolSpec>,
    transcript: Transcript,
    steps_used: u32,
    tool_calls_made: u32,
    cancel: CancellationToken,
    events: Option<mpsc::Sender<StepEvent>>,
}

impl RunCtx<'_> {
    /// Ask the model for its next step and record it. Malformed output is
    /// retried up to the parse-retry budget without consuming steps.
    async fn advance(&mut self) -> Result<LoopState, Error> {
        let mut parse_failures = 0u32;
        loop {
            let result = tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Ok(LoopState::Failed(FailureReason::Cancelled));
                }
                r = self.agent.client.next_step(&self.transcript, &self.specs) => r,
            };

            match result {
                Ok(step) => {
                    self.steps_used += 1;
                    return Ok(self.record(step).await);
                }
                Err(StepError::Malformed(e)) => {
                    parse_failures += 1;
                    warn!(attempt = parse_failures, error = %e, "Unparseable model output");
                    if parse_failures > self.agent.max_parse_retries {
                        return Ok(LoopState::Failed(FailureReason::MalformedResponse));
                    }
                }
                Err(StepError::Provider(e)) => return Err(e.into()),
            }
        }
    }

    /// Append a parsed step to the transcript and pick the next state.
    async fn record(&mut self, step: NextStep) -> LoopState {
        match step {
            NextStep::Thought(content) => {
                debug!(step = self.steps_used, "Thought");
                self.transcript.push_thought(&content);
                self.emit(StepEvent::Thought { content }).await;
                LoopState::Running
            }
            NextStep::Action { thought, call } => {
                if let Some(content) = thought {
                    self.transcript.push_thought(&content);
                    self.emit(StepEvent::Thought { content }).await;
                }
                debug!(tool = %call.name, "Action");
                self.transcript.push_action(&call.name, call.arguments.clone());
                self.emit(StepEvent::Action {
                    tool_name: call.name.clone(),
                    arguments: call.arguments.clone(),
                })
                .await;
                LoopState::AwaitingTool(call)
            }
            NextStep::FinalAnswer { thought, answer } => {
                if let Some(content) = thought {
                    self.transcript.push_thought(&content);
                    self.emit(StepEvent::Thought { content }).await;
                }
                self.transcript.push_final_answer(&answer);
                LoopState::Done(answer)
            }
        }
    }

    /// Execute a recorded tool call and append its observation. Tool
    /// failures are recoverable: the error text becomes the observation
    /// and the loop continues.
    async fn execute_tool(&mut self, call: ToolCall) -> LoopState {
        self.tool_calls_made += 1;

        let raced = tokio::select! {
            _ = self.cancel.cancelled() => None,
            r = tokio::time::timeout(
                self.agent.tool_timeout,
                self.agent.tools.invoke(&call),
            ) => Some(r),
        };

        let result = match raced {
            None => {
                // Keep the Action/Observation pairing intact on the way out.
                self.observe("Error: run cancelled during tool execution", true)
                    .await;
                return LoopState::Failed(FailureReason::Cancelled);
            }
            Some(Ok(r)) => r,
            Some(Err(_)) => Err(ToolError::Timeout {
                tool_name: call.name.clone(),
                timeout_secs: self.agent.tool_timeout.as_secs(),
            }),
        };

        match result {
            Ok(output) => {
                debug!(tool = %call.name, "Tool succeeded");
                self.observe(output.content, false).await;
            }
            Err(ToolError::NotFound(name)) => {
                let available = self.agent.tools.names().join(", ");
                warn!(tool = %name, "Unknown tool requested");
                self.observe(
                    format!("Error: unknown tool '{name}'. Available tools: {available}"),
                    true,
                )
                .await;
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool failed");
                self.observe(format!("Error: {e}"), true).await;
            }
        }

        LoopState::Running
    }

    async fn observe(&mut self, content: impl Into<String>, is_error: bool) {
        let content = content.into();
        if is_error {
            self.transcript.push_error_observation(&content);
        } else {
            self.transcript.push_observation(&content);
        }
        self.emit(StepEvent::Observation { content, is_error }).await;
    }

    async fn emit(&self, event: StepEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means nobody is watching.
            let _ = tx.send(event).await;
        }
    }

    fn report(self, outcome: Outcome) -> RunReport {
        RunReport {
            outcome,
            transcript: self.transcript,
            steps_used: self.steps_used,
            tool_calls_made: self.tool_calls_made,
        }
    }
}
