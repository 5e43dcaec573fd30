use console::style;
use std::io::Write;
use std::path::Path;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::database::postgres::VectorStore;
use crate::database::postgres::models::ScoredChunk;
use crate::ingest::{Ingestor, SAMPLE_DOCUMENT};
use crate::ollama::OllamaClient;
use crate::query::{DEFAULT_QUESTION, QueryRunner, RagAnswer};
use crate::{FailureKind, RagError, Result};

/// What a single pipeline run ingests and asks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub question: String,
    pub document: String,
}

impl Default for RunOptions {
    #[inline]
    fn default() -> Self {
        Self {
            question: DEFAULT_QUESTION.to_string(),
            document: SAMPLE_DOCUMENT.to_string(),
        }
    }
}

impl RunOptions {
    /// Build options from command-line values, reading the document from disk when given
    #[inline]
    pub fn from_args(question: Option<String>, document: Option<&Path>) -> Result<Self> {
        let document = match document {
            Some(path) => std::fs::read_to_string(path)?,
            None => SAMPLE_DOCUMENT.to_string(),
        };

        Ok(Self {
            question: question.unwrap_or_else(|| DEFAULT_QUESTION.to_string()),
            document,
        })
    }
}

/// Initialize the store, ingest the document and answer the question.
///
/// The connection is closed before returning, whatever the outcome.
#[inline]
pub async fn run_pipeline(config: &Config, options: &RunOptions) -> Result<RagAnswer> {
    println!(
        "{}",
        style("Retrieval-augmented generation over PostgreSQL and Ollama")
            .bold()
            .cyan()
    );

    println!("\n--- Connecting to PostgreSQL database ---");
    let mut store =
        VectorStore::initialize(&config.database, config.ollama.embedding_dimension).await?;
    println!(
        "Connection successful! Table 'documents' ready with a VECTOR({}) column.",
        config.ollama.embedding_dimension
    );

    let result = run_stages(config, &mut store, options).await;

    if let Err(e) = store.close().await {
        warn!("Failed to close PostgreSQL connection: {}", e);
    }

    result
}

async fn run_stages(
    config: &Config,
    store: &mut VectorStore,
    options: &RunOptions,
) -> Result<RagAnswer> {
    let client = OllamaClient::new(&config.ollama)?;

    println!("\n--- Ingesting data and creating embeddings ---");
    let report = Ingestor::new(&client)
        .ingest(store, &options.document)
        .await?;
    if report.chunks == 0 {
        warn!("Document produced no chunks; retrieval will return nothing");
    }
    println!(
        "\nData ingestion complete: {} chunks stored.",
        style(report.chunks).green()
    );

    println!("\n--- Processing user query: '{}' ---", options.question);
    let runner = QueryRunner::new(&client, &client, config.retrieval.clone());
    let generation_model = client.generation_model();

    let mut stdout = std::io::stdout();
    let answer = runner
        .run(
            store,
            &options.question,
            |retrieved| {
                print_retrieved(retrieved);
                println!("\n--- Generating response with {generation_model} ---");
                println!("Response:");
            },
            &mut |fragment| {
                write!(stdout, "{fragment}")?;
                stdout.flush()?;
                Ok(())
            },
        )
        .await?;

    println!("\n\n--- RAG process complete ---");
    info!(
        "Answered with {} characters from {} chunks",
        answer.answer.len(),
        answer.retrieved.len()
    );
    Ok(answer)
}

fn print_retrieved(retrieved: &[ScoredChunk]) {
    println!("\n--- Retrieved the following relevant chunks from the database ---");
    if retrieved.is_empty() {
        println!("(no chunks stored)");
    }
    for (i, chunk) in retrieved.iter().enumerate() {
        println!(
            "Chunk {}: {} {}",
            i + 1,
            chunk.content,
            style(format!("(distance {:.4})", chunk.distance)).dim()
        );
    }
}

/// Print a failure the way a user can act on it
#[inline]
pub fn report_failure(err: &RagError) {
    error!("Run aborted: {}", err);

    eprintln!();
    eprintln!("{} {}", style("Error:").red().bold(), err);
    eprintln!("{}", failure_hint(err));
}

/// Remediation hint for a failure
#[inline]
pub fn failure_hint(err: &RagError) -> &'static str {
    match (err.kind(), err) {
        (FailureKind::Connectivity, RagError::Connection { .. }) => {
            "Could not connect to PostgreSQL. Make sure the server is running and the credentials in the configuration are correct."
        }
        (FailureKind::Connectivity, _) => {
            "Could not connect to Ollama. Make sure `ollama serve` is running and the models are pulled."
        }
        (FailureKind::MissingCapability, RagError::MissingVectorExtension { .. }) => {
            "pgvector extension not found. Install it and run `CREATE EXTENSION vector;` in the target database."
        }
        (FailureKind::MissingCapability, _) => {
            "The configuration is invalid. Check config.toml or run `ollama-pg-rag config`."
        }
        (FailureKind::Unexpected, _) => "An unexpected error occurred; nothing was retried.",
    }
}

/// Print the effective configuration with secrets masked
#[inline]
pub fn show_config(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(&config.redacted())
        .map_err(|e| RagError::Other(anyhow::anyhow!("Failed to render configuration: {e}")))?;

    println!("{}", style("Current configuration").bold().cyan());
    println!(
        "Config file: {}",
        style(config.config_file_path().display()).cyan()
    );
    println!();
    println!("{rendered}");
    Ok(())
}

/// Write the effective configuration to `config.toml`, leaving an existing file alone
#[inline]
pub fn init_config(config: &Config) -> Result<()> {
    let path = config.config_file_path();
    if path.exists() {
        println!("Configuration already exists at {}", path.display());
        return Ok(());
    }

    config.save()?;
    println!(
        "{} {}",
        style("✓ Configuration written to").green(),
        style(path.display()).cyan()
    );
    Ok(())
}
