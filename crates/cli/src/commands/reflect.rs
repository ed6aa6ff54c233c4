//! `reagent reflect` — Run a task through the draft/critique/revise loop.

use std::sync::Arc;
use std::time::Duration;

use reagent_agent::runner::Outcome;
use reagent_agent::{ReflectionLoop, ReflectionStep};
use reagent_core::Task;
use reagent_providers::OpenAiCompatProvider;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct ReflectArgs {
    pub task: String,
    pub context: Option<String>,
    pub config: Option<String>,
    pub model: Option<String>,
    pub max_rounds: Option<u32>,
    pub json: bool,
}

pub async fn run(args: ReflectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(args.config.as_deref())
        .map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(model) = args.model {
        config.model = model;
    }

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

    let mut agent = ReflectionLoop::new(provider, &config.model)
        .with_temperature(config.temperature)
        .with_max_tokens(Some(config.max_tokens))
        .with_timeout(Duration::from_secs(config.loop_config.llm_timeout_secs));
    if let Some(max_rounds) = args.max_rounds {
        agent = agent.with_max_rounds(max_rounds);
    }

    let mut task = Task::new(&args.task);
    if let Some(context) = args.context {
        task = task.with_context(context);
    }

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling run");
            ctrl_c_token.cancel();
        }
    });

    let report = agent.run(task, cancel).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for step in &report.history {
            match step {
                ReflectionStep::Draft { content } => {
                    println!("--- Draft ---");
                    println!("{content}");
                }
                ReflectionStep::Critique { content, approved } => {
                    println!("--- Critique{} ---", if *approved { " (approved)" } else { "" });
                    println!("{content}");
                }
                ReflectionStep::Revision { content } => {
                    println!("--- Revision ---");
                    println!("{content}");
                }
            }
            println!();
        }

        match &report.outcome {
            Outcome::Done { answer } => {
                println!("Final ({} rounds):", report.rounds_used);
                println!("{answer}");
            }
            Outcome::Failed { reason } => {
                println!("Run failed: {reason}");
            }
        }
    }

    match &report.outcome {
        Outcome::Done { .. } => Ok(()),
        Outcome::Failed { reason } => Err(format!("run failed: {reason}").into()),
    }
}
