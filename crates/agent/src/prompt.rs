//! Prompt rendering for the agent loop.
//!
//! The system prompt carries the agent's role, the tool catalogue, and the
//! response grammar. The user prompt carries the task and the transcript
//! so far, rendered with the same markers the grammar expects.

use reagent_core::provider::CompletionRequest;
use reagent_core::tool::ToolSpec;
use reagent_core::Transcript;

/// The stop sequence sent with every completion request. Generation halts
/// before the model can invent a tool result.
pub const OBSERVATION_STOP: &str = "Observation:";

/// Render the system prompt from the available tool specs.
pub fn system_prompt(specs: &[ToolSpec]) -> String {
    let mut out = String::from(
        "You are a helpful assistant that solves tasks step by step using tools.\n\n\
         You have access to the following tools:\n\n",
    );

    for spec in specs {
        out.push_str(&format!(
            "- {}: {}\n  Arguments (JSON Schema): {}\n",
            spec.name, spec.description, spec.parameters
        ));
    }

    out.push_str(
        "\nRespond using EXACTLY this format.\n\n\
         To use a tool:\n\
         Thought: <your reasoning about what to do next>\n\
         Action: <tool name, exactly as listed above>\n\
         Action Input: <arguments as a single JSON object>\n\n\
         When you know the answer:\n\
         Thought: <your reasoning>\n\
         Final Answer: <the answer to the task>\n\n\
         Rules:\n\
         - Emit exactly one Action OR one Final Answer per response, never both.\n\
         - Never write an Observation yourself. Observations are provided to you.\n\
         - Action Input must be valid JSON on its own.\n",
    );

    out
}

/// Render the user prompt: the task, optional caller context, and the
/// reasoning history so far.
pub fn user_prompt(transcript: &Transcript) -> String {
    let mut out = format!("Task: {}\n", transcript.task.goal);

    if let Some(context) = &transcript.task.context {
        out.push_str(&format!("\nContext:\n{context}\n"));
    }

    if !transcript.is_empty() {
        out.push_str("\nProgress so far:\n");
        out.push_str(&transcript.render());
    }

    out.push_str("\nWhat is your next step?");
    out
}

/// Assemble a full completion request for one loop iteration.
pub fn build_request(
    model: &str,
    temperature: f32,
    max_tokens: Option<u32>,
    specs: &[ToolSpec],
    transcript: &Transcript,
) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        system_prompt: system_prompt(specs),
        user_prompt: user_prompt(transcript),
        temperature,
        max_tokens,
        stop: vec![OBSERVATION_STOP.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reagent_core::Task;

    fn spec() -> ToolSpec {
        ToolSpec {
            name: "calculator".into(),
            description: "Evaluates arithmetic expressions".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {"expression": {"type": "string"}},
                "required": ["expression"]
            }),
        }
    }

    #[test]
    fn system_prompt_lists_tools_and_grammar() {
        let prompt = system_prompt(&[spec()]);
        assert!(prompt.contains("- calculator: Evaluates arithmetic expressions"));
        assert!(prompt.contains("Action Input:"));
        assert!(prompt.contains("Final Answer:"));
        assert!(prompt.contains("Never write an Observation"));
    }

    #[test]
    fn user_prompt_for_fresh_task() {
        let transcript = Transcript::new(Task::new("What is 12 * 7?"));
        let prompt = user_prompt(&transcript);
        assert!(prompt.starts_with("Task: What is 12 * 7?"));
        assert!(!prompt.contains("Progress so far"));
    }

    #[test]
    fn user_prompt_includes_history() {
        let mut transcript = Transcript::new(Task::new("What is 12 * 7?"));
        transcript.push_thought("use the calculator");
        transcript.push_action("calculator", serde_json::json!({"expression": "12*7"}));
        transcript.push_observation("84");

        let prompt = user_prompt(&transcript);
        assert!(prompt.contains("Progress so far:"));
        assert!(prompt.contains("Thought: use the calculator"));
        assert!(prompt.contains("Observation: 84"));
    }

    #[test]
    fn user_prompt_includes_context_when_set() {
        let task = Task::new("continue the report").with_context("yesterday we covered Q1");
        let prompt = user_prompt(&Transcript::new(task));
        assert!(prompt.contains("Context:\nyesterday we covered Q1"));
    }

    #[test]
    fn request_carries_observation_stop() {
        let transcript = Transcript::new(Task::new("hi"));
        let req = build_request("gpt-4o-mini", 0.2, Some(512), &[spec()], &transcript);
        assert_eq!(req.stop, vec!["Observation:"]);
        assert_eq!(req.model, "gpt-4o-mini");
        assert_eq!(req.max_tokens, Some(512));
    }
}
