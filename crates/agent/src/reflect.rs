//! Reflection loop — draft, critique, revise.
//!
//! A second reasoning paradigm alongside the ReAct runner: the model
//! produces an initial draft, a critic pass reviews it, and a revision
//! pass applies the feedback. The cycle repeats until the critic approves
//! or the round budget runs out; the last draft is always returned. No
//! tools are involved, so the loop is three prompt shapes over the same
//! provider.

use std::sync::Arc;
use std::time::Duration;

use reagent_core::error::{Error, ProviderError};
use reagent_core::provider::{CompletionRequest, Provider};
use reagent_core::Task;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::runner::{FailureReason, Outcome};

const DRAFT_SYSTEM: &str = "You are a senior engineer. Produce a complete, \
    high-quality solution to the task. Output the solution directly, with \
    no extra commentary.";

const CRITIQUE_SYSTEM: &str = "You are an exacting reviewer. Examine the \
    solution below and identify its most significant weaknesses: \
    correctness issues, inefficiencies, or missing requirements. Propose \
    concrete, actionable improvements. Only if the solution cannot be \
    meaningfully improved, reply with the single word APPROVED.";

const REVISE_SYSTEM: &str = "You are a senior engineer revising your \
    earlier solution based on a reviewer's feedback. Produce the improved \
    solution in full. Output it directly, with no extra commentary.";

/// One entry in the draft/critique/revision history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReflectionStep {
    /// The initial attempt at the task.
    Draft { content: String },

    /// The critic's feedback on the latest attempt.
    Critique { content: String, approved: bool },

    /// A revised attempt incorporating the feedback.
    Revision { content: String },
}

/// The full result of one reflection run. The history is always present,
/// even for cancelled runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionReport {
    pub outcome: Outcome,
    pub task: Task,
    pub history: Vec<ReflectionStep>,
    pub rounds_used: u32,

    /// Whether the critic approved the final draft (false when the round
    /// budget ran out first).
    pub approved: bool,
}

impl ReflectionReport {
    /// The final draft, if the run completed.
    pub fn answer(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Done { answer } => Some(answer),
            Outcome::Failed { .. } => None,
        }
    }
}

/// A configured, reusable reflection loop.
#[derive(Clone)]
pub struct ReflectionLoop {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
    max_rounds: u32,
}

impl ReflectionLoop {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: Some(1024),
            timeout: Duration::from_secs(60),
            max_rounds: 3,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Deadline for a single completion call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Maximum critique/revise rounds after the initial draft. Must be at
    /// least 1.
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    /// Run a task through draft, critique, revise cycles.
    pub async fn run(
        &self,
        task: Task,
        cancel: CancellationToken,
    ) -> Result<ReflectionReport, Error> {
        info!(task_id = %task.id, goal = %task.goal, "Starting reflection run");

        let mut history: Vec<ReflectionStep> = Vec::new();
        let mut rounds_used = 0u32;

        let draft = match self.complete(DRAFT_SYSTEM, draft_prompt(&task), &cancel).await? {
            Some(text) => text,
            None => return Ok(cancelled(task, history, rounds_used)),
        };
        history.push(ReflectionStep::Draft {
            content: draft.clone(),
        });

        let mut current = draft;
        let mut approved = false;

        for round in 1..=self.max_rounds {
            rounds_used = round;
            debug!(round, max_rounds = self.max_rounds, "Critique pass");

            let critique = match self
                .complete(CRITIQUE_SYSTEM, critique_prompt(&task, &current), &cancel)
                .await?
            {
                Some(text) => text,
                None => return Ok(cancelled(task, history, rounds_used)),
            };
            let accepted = is_approved(&critique);
            history.push(ReflectionStep::Critique {
                content: critique.clone(),
                approved: accepted,
            });

            if accepted {
                info!(round, "Critic approved the draft");
                approved = true;
                break;
            }

            debug!(round, "Revision pass");
            let revision = match self
                .complete(
                    REVISE_SYSTEM,
                    revise_prompt(&task, &current, &critique),
                    &cancel,
                )
                .await?
            {
                Some(text) => text,
                None => return Ok(cancelled(task, history, rounds_used)),
            };
            history.push(ReflectionStep::Revision {
                content: revision.clone(),
            });
            current = revision;
        }

        info!(rounds = rounds_used, approved, "Reflection run finished");
        Ok(ReflectionReport {
            outcome: Outcome::Done { answer: current },
            task,
            history,
            rounds_used,
            approved,
        })
    }

    /// One provider call under the timeout, raced against cancellation.
    /// `None` means the run was cancelled.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: String,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, Error> {
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let request = CompletionRequest {
            model: self.model.clone(),
            system_prompt: system_prompt.to_string(),
            user_prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stop: vec![],
        };

        let raced = tokio::select! {
            _ = cancel.cancelled() => None,
            r = tokio::time::timeout(self.timeout, self.provider.complete(request)) => Some(r),
        };

        match raced {
            None => Ok(None),
            Some(Ok(completion)) => Ok(Some(completion?.text)),
            Some(Err(_)) => Err(ProviderError::Timeout(format!(
                "no completion within {}s",
                self.timeout.as_secs()
            ))
            .into()),
        }
    }
}

fn cancelled(task: Task, history: Vec<ReflectionStep>, rounds_used: u32) -> ReflectionReport {
    ReflectionReport {
        outcome: Outcome::Failed {
            reason: FailureReason::Cancelled,
        },
        task,
        history,
        rounds_used,
        approved: false,
    }
}

/// The critic signals acceptance with a bare APPROVED line.
fn is_approved(critique: &str) -> bool {
    critique
        .lines()
        .any(|line| line.trim().trim_end_matches('.') == "APPROVED")
}

fn draft_prompt(task: &Task) -> String {
    let mut out = format!("Task: {}\n", task.goal);
    if let Some(context) = &task.context {
        out.push_str(&format!("\nContext:\n{context}\n"));
    }
    out
}

fn critique_prompt(task: &Task, draft: &str) -> String {
    format!(
        "Original task:\n{}\n\nSolution under review:\n{}\n",
        task.goal, draft
    )
}

fn revise_prompt(task: &Task, draft: &str, feedback: &str) -> String {
    format!(
        "Original task:\n{}\n\nYour previous solution:\n{}\n\nReviewer feedback:\n{}\n",
        task.goal, draft, feedback
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{PendingProvider, ScriptedProvider};

    fn reflection(provider: ScriptedProvider) -> ReflectionLoop {
        ReflectionLoop::new(Arc::new(provider), "test-model")
    }

    #[tokio::test]
    async fn approved_on_first_critique() {
        let agent = reflection(ScriptedProvider::new(vec![
            "fn add(a: i32, b: i32) -> i32 { a + b }",
            "APPROVED",
        ]));

        let report = agent
            .run(Task::new("write an add function"), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.answer(), Some("fn add(a: i32, b: i32) -> i32 { a + b }"));
        assert!(report.approved);
        assert_eq!(report.rounds_used, 1);
        assert_eq!(report.history.len(), 2);
        assert!(matches!(
            report.history[1],
            ReflectionStep::Critique { approved: true, .. }
        ));
    }

    #[tokio::test]
    async fn critique_drives_a_revision() {
        let agent = reflection(ScriptedProvider::new(vec![
            "trial division",
            "Trial division is O(n sqrt n); use a sieve instead.",
            "sieve of eratosthenes",
            "APPROVED",
        ]));

        let report = agent
            .run(Task::new("find primes up to n"), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.answer(), Some("sieve of eratosthenes"));
        assert!(report.approved);
        assert_eq!(report.rounds_used, 2);
        assert_eq!(report.history.len(), 4);
        assert!(matches!(
            report.history[2],
            ReflectionStep::Revision { .. }
        ));
    }

    #[tokio::test]
    async fn round_budget_returns_last_revision() {
        let agent = reflection(ScriptedProvider::new(vec![
            "draft one",
            "still too slow",
            "draft two",
            "still not great",
            "draft three",
        ]))
        .with_max_rounds(2);

        let report = agent
            .run(Task::new("hard task"), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.answer(), Some("draft three"));
        assert!(!report.approved);
        assert_eq!(report.rounds_used, 2);
    }

    #[test]
    fn approved_with_trailing_period() {
        assert!(is_approved("APPROVED."));
        assert!(is_approved("Looks good now.\nAPPROVED"));
        assert!(!is_approved("This is NOT approved, fix the loop."));
    }

    #[tokio::test]
    async fn pre_cancelled_run_does_nothing() {
        let agent = reflection(ScriptedProvider::new(vec![]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = agent.run(Task::new("anything"), cancel).await.unwrap();

        assert!(matches!(
            report.outcome,
            Outcome::Failed {
                reason: FailureReason::Cancelled
            }
        ));
        assert!(report.history.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_draft_call() {
        let agent = ReflectionLoop::new(Arc::new(PendingProvider), "test-model");
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let report = agent.run(Task::new("anything"), cancel).await.unwrap();
        assert!(matches!(
            report.outcome,
            Outcome::Failed {
                reason: FailureReason::Cancelled
            }
        ));
        assert!(report.history.is_empty());
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let agent = reflection(ScriptedProvider::failing(ProviderError::Network(
            "connection refused".into(),
        )));

        let err = agent
            .run(Task::new("anything"), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::Network(_))));
    }
}
