//! Vecta CLI entry point.
//!
//! Commands:
//! - `init`: Write a default config file
//! - `context`: Assemble the context block for a query
//! - `prompt`: Render the full prompt around the context block
//! - `detect`: Show which condition a text maps to
//! - `retrieve`: Rank guideline snippets by similarity
//! - `stats`: Summarize the loaded data
//! - `validate`: Check the data files entry by entry
//! - `doctor`: Diagnose config, data and retrieval

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vecta_config::{AppConfig, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "vecta",
    about = "Vecta — clinical prompt-context engine",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.vecta/config.toml)
    #[arg(short, long, global = true, env = "VECTA_CONFIG")]
    config: Option<PathBuf>,
}

/// Request knobs shared by `context` and `prompt`.
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Clinical free text to build context for
    query: String,

    /// Specialty hint (e.g. neurology, movement_disorders)
    #[arg(short, long)]
    specialty: Option<String>,

    /// classification, diagnosis, extraction or summary
    #[arg(short, long)]
    analysis_type: Option<String>,

    /// Number of worked examples to include
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    num_examples: Option<i64>,

    /// Leave the guidelines section out
    #[arg(long)]
    no_guidelines: bool,

    /// Character budget for guideline text
    #[arg(short, long, allow_negative_numbers = true)]
    budget: Option<i64>,

    /// Force retrieval on or off for this request
    #[arg(long)]
    retrieval: Option<bool>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Assemble the context block for a query
    Context {
        #[command(flatten)]
        request: RequestArgs,

        /// Print the block and its metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render the full model prompt for a query
    Prompt {
        #[command(flatten)]
        request: RequestArgs,

        /// What the model should do with the data
        #[arg(short, long, default_value = "Analyze this clinical case")]
        task: String,
    },

    /// Show which condition a text maps to
    Detect {
        text: String,

        #[arg(short, long)]
        specialty: Option<String>,
    },

    /// Rank guideline snippets by similarity to a query
    Retrieve {
        query: String,

        /// Number of results
        #[arg(short)]
        k: Option<usize>,

        /// Restrict to one condition tag
        #[arg(long)]
        condition: Option<String>,
    },

    /// Summarize the loaded examples and guidelines
    Stats,

    /// Check every entry of the data files; fails on any rejected entry
    Validate,

    /// Diagnose config, data files and retrieval readiness
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);

    // Initialize tracing
    let logging = AppConfig::load_with_env(&config_path)
        .map(|c| c.logging)
        .unwrap_or_default();
    init_tracing(&logging, cli.verbose);
    tracing::debug!(config = %config_path.display(), "Using config");

    match cli.command {
        Commands::Init { force } => commands::init::run(&config_path, force).await?,
        Commands::Context { request, json } => {
            commands::context::run(&config_path, &request, json).await?
        }
        Commands::Prompt { request, task } => {
            commands::prompt::run(&config_path, &request, &task).await?
        }
        Commands::Detect { text, specialty } => {
            commands::detect::run(&text, specialty.as_deref()).await?
        }
        Commands::Retrieve { query, k, condition } => {
            commands::retrieve::run(&config_path, &query, k, condition.as_deref()).await?
        }
        Commands::Stats => commands::stats::run(&config_path).await?,
        Commands::Validate => commands::validate::run(&config_path).await?,
        Commands::Doctor => commands::doctor::run(&config_path).await?,
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let filter = if verbose { "debug" } else { logging.level.as_str() };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
