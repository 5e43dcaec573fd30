use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ollama_pg_rag::Result;
use ollama_pg_rag::commands::{RunOptions, init_config, report_failure, run_pipeline, show_config};
use ollama_pg_rag::config::{Config, get_config_dir};

#[derive(Parser)]
#[command(name = "ollama-pg-rag")]
#[command(about = "Answer questions over a document with pgvector retrieval and a local Ollama model")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml (defaults to ~/.ollama-pg-rag)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the table, ingest the document and answer the question (default)
    Run {
        /// Question to answer
        #[arg(long)]
        question: Option<String>,
        /// Text file to ingest instead of the built-in sample document
        #[arg(long)]
        document: Option<PathBuf>,
    },
    /// Show the effective configuration
    Config {
        /// Write the effective configuration to config.toml if it does not exist
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Run {
        question: None,
        document: None,
    }) {
        Commands::Run { question, document } => {
            let options = RunOptions::from_args(question, document.as_deref())?;
            run_pipeline(&config, &options).await?;
        }
        Commands::Config { init } => {
            if init {
                init_config(&config)?;
            } else {
                show_config(&config)?;
            }
        }
    }

    Ok(())
}

fn load_config(config_dir: Option<&Path>) -> Result<Config> {
    let config_dir = match config_dir {
        Some(dir) => dir.to_path_buf(),
        None => get_config_dir()?,
    };
    let config = Config::load(config_dir)?;
    Ok(config)
}
