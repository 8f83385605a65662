//! Let an agent loose on a codebase.
//!
//! Reads the API key from the `OPENROUTER_KEY` environment variable.
//!
//! ```sh
//! wayfarer --workdir /path/to/project --max-steps 50
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use wayfarer::environment::local::{LocalConfig, LocalEnvironment};
use wayfarer::events::{CompositeEventHandler, LoggingHandler};
use wayfarer::llm::{DEFAULT_MODEL, OpenRouterClient};
use wayfarer::memory::JsonFileStore;
use wayfarer::reasoning::openrouter::OpenRouterReasoning;
use wayfarer::{Agent, AgentConfig, RunOutcome};

/// Let an agent explore, read and edit a codebase.
#[derive(Parser)]
#[command(name = "wayfarer", version)]
struct Cli {
    /// Root of the tree the agent may explore.
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Name the agent goes by.
    #[arg(long, default_value = wayfarer::config::DEFAULT_AGENT_NAME)]
    name: String,

    /// Model to use for completions.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Maximum perceptions to handle before giving up.
    #[arg(long, default_value_t = wayfarer::config::DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Lines per editor page.
    #[arg(long, default_value_t = wayfarer::fs::DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Maximum tokens per LLM response.
    #[arg(long, default_value_t = 2048)]
    max_tokens: u32,

    /// Sampling temperature (provider default when unset).
    #[arg(long)]
    temperature: Option<f32>,

    /// Wait for complete responses instead of streaming speech.
    #[arg(long)]
    no_stream: bool,

    /// JSON file holding takeaways across sessions.
    #[arg(long, default_value = ".wayfarer/takeaways.json")]
    store: PathBuf,

    /// Directory filed tickets are written to.
    #[arg(long, default_value = ".wayfarer/tickets")]
    tickets_dir: PathBuf,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(level)
        .init();

    let workdir = std::fs::canonicalize(&cli.workdir).unwrap_or_else(|_| cli.workdir.clone());
    if !workdir.is_dir() {
        eprintln!("Error: {} is not a directory", workdir.display());
        std::process::exit(1);
    }

    let mut config = AgentConfig::new(cli.name)
        .with_model(cli.model)
        .with_max_steps(cli.max_steps)
        .with_page_size(cli.page_size)
        .with_max_tokens(cli.max_tokens)
        .with_streaming(!cli.no_stream)
        .with_tickets_dir(cli.tickets_dir);
    if let Some(temperature) = cli.temperature {
        config = config.with_temperature(temperature);
    }

    let api_key = match std::env::var("OPENROUTER_KEY") {
        Ok(key) => key,
        Err(_) => {
            eprintln!("Error: OPENROUTER_KEY environment variable is not set");
            std::process::exit(1);
        }
    };
    let client = match OpenRouterClient::new(api_key) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: failed to create API client: {e}");
            std::process::exit(1);
        }
    };

    let store = match JsonFileStore::open(&cli.store).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: failed to open {}: {e}", cli.store.display());
            std::process::exit(1);
        }
    };

    let reasoning = OpenRouterReasoning::new(client, &config);
    let environment = LocalEnvironment::new(&workdir, LocalConfig::from(&config));
    let events = CompositeEventHandler::new().with(LoggingHandler);

    let result = Agent::new(&reasoning, &environment, &store, config)
        .with_event_handler(&events)
        .run()
        .await;

    match result {
        Ok(RunOutcome::HandedOff { note }) => {
            println!("\n--- Notes ---\n{note}");
        }
        Ok(RunOutcome::EnvironmentClosed) => {
            println!("\nThe environment closed.");
        }
        Ok(RunOutcome::StepLimitReached { steps }) => {
            println!("\nStopped after {steps} steps.");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
