//! Reagent CLI — the main entry point.
//!
//! Commands:
//! - `run`      — Execute a task through the ReAct agent loop
//! - `reflect`  — Execute a task through the draft/critique/revise loop
//! - `tools`    — List the available tools

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "reagent",
    about = "Reagent — a ReAct tool-using agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a task through the agent loop
    Run {
        /// The task to solve
        task: String,

        /// Extra context to attach to the task
        #[arg(long)]
        context: Option<String>,

        /// Path to a TOML config file (defaults + env vars when omitted)
        #[arg(short, long)]
        config: Option<String>,

        /// Override the model from the config
        #[arg(short, long)]
        model: Option<String>,

        /// Override the step budget from the config
        #[arg(long)]
        max_steps: Option<u32>,

        /// Print steps live as they land
        #[arg(short, long)]
        stream: bool,

        /// Print the full run report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Execute a task through the draft/critique/revise loop
    Reflect {
        /// The task to solve
        task: String,

        /// Extra context to attach to the task
        #[arg(long)]
        context: Option<String>,

        /// Path to a TOML config file (defaults + env vars when omitted)
        #[arg(short, long)]
        config: Option<String>,

        /// Override the model from the config
        #[arg(short, long)]
        model: Option<String>,

        /// Maximum critique/revise rounds
        #[arg(long)]
        max_rounds: Option<u32>,

        /// Print the full report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the available tools
    Tools {
        /// Path to a TOML config file (defaults + env vars when omitted)
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            task,
            context,
            config,
            model,
            max_steps,
            stream,
            json,
        } => {
            commands::run::run(commands::run::RunArgs {
                task,
                context,
                config,
                model,
                max_steps,
                stream,
                json,
            })
            .await?
        }
        Commands::Reflect {
            task,
            context,
            config,
            model,
            max_rounds,
            json,
        } => {
            commands::reflect::run(commands::reflect::ReflectArgs {
                task,
                context,
                config,
                model,
                max_rounds,
                json,
            })
            .await?
        }
        Commands::Tools { config } => commands::tools::run(config.as_deref())?,
    }

    Ok(())
}
