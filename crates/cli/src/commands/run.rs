//! `reagent run` — Execute a task through the agent loop.

use std::sync::Arc;
use std::time::Duration;

use reagent_agent::runner::Outcome;
use reagent_agent::{AgentLoop, StepClient, StepEvent};
use reagent_core::{Step, Task, Transcript};
use reagent_providers::OpenAiCompatProvider;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct RunArgs {
    pub task: String,
    pub context: Option<String>,
    pub config: Option<String>,
    pub model: Option<String>,
    pub max_steps: Option<u32>,
    pub stream: bool,
    pub json: bool,
}

pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(args.config.as_deref())
        .map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(max_steps) = args.max_steps {
        config.loop_config.max_steps = max_steps;
    }

    // Check for API key early, before building anything
    if config.api_key.is_none() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set the REAGENT_API_KEY environment variable, or add");
        eprintln!("  api_key = \"sk-...\" to your config file.");
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let provider = Arc::new(OpenAiCompatProvider::from_config(&config)?);

    let tools = Arc::new(reagent_tools::default_registry(
        config.tools.retrieval_url.as_deref(),
        config.tools.retrieval_top_k,
    )?);

    let client = StepClient::new(provider, &config.model)
        .with_temperature(config.temperature)
        .with_max_tokens(Some(config.max_tokens))
        .with_timeout(Duration::from_secs(config.loop_config.llm_timeout_secs));

    let agent = AgentLoop::new(client, tools)
        .with_max_steps(config.loop_config.max_steps)
        .with_max_parse_retries(config.loop_config.max_parse_retries)
        .with_tool_timeout(Duration::from_secs(config.loop_config.tool_timeout_secs));

    let mut task = Task::new(&args.task);
    if let Some(context) = args.context {
        task = task.with_context(context);
    }

    // Ctrl-C cancels the run; the partial transcript is still printed.
    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling run");
            ctrl_c_token.cancel();
        }
    });

    let report = if args.stream {
        let (mut rx, handle) = agent.run_stream(task, cancel);
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
        handle.await??
    } else {
        agent.run(task, cancel).await?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return finish(&report.outcome);
    }

    if !args.stream {
        print_transcript(&report.transcript);
    }

    match &report.outcome {
        Outcome::Done { answer } => {
            println!();
            println!("Answer: {answer}");
            println!(
                "({} steps, {} tool calls)",
                report.steps_used, report.tool_calls_made
            );
        }
        Outcome::Failed { reason } => {
            println!();
            println!("Run failed: {reason}");
            println!("({} steps recorded)", report.steps_used);
        }
    }

    finish(&report.outcome)
}

fn finish(outcome: &Outcome) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        Outcome::Done { .. } => Ok(()),
        Outcome::Failed { reason } => Err(format!("run failed: {reason}").into()),
    }
}

fn print_event(event: &StepEvent) {
    match event {
        StepEvent::Thought { content } => println!("Thought: {content}"),
        StepEvent::Action {
            tool_name,
            arguments,
        } => println!("Action: {tool_name} {arguments}"),
        StepEvent::Observation { content, is_error } => {
            if *is_error {
                println!("Observation (error): {content}");
            } else {
                println!("Observation: {content}");
            }
        }
        StepEvent::Done { .. } | StepEvent::Failed { .. } => {}
    }
}

fn print_transcript(transcript: &Transcript) {
    for step in transcript.steps() {
        match step {
            Step::Thought { content } => println!("Thought: {content}"),
            Step::Action {
                tool_name,
                arguments,
            } => println!("Action: {tool_name} {arguments}"),
            Step::Observation { content, is_error } => {
                if *is_error {
                    println!("Observation (error): {content}");
                } else {
                    println!("Observation: {content}");
                }
            }
            Step::FinalAnswer { .. } => {}
        }
    }
}
