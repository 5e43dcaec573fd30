
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::Result;
use crate::database::postgres::VectorStore;
use crate::database::postgres::models::NewChunk;
use crate::ollama::Embedder;

/// Characters that end a sentence for chunking purposes
const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];
const PREVIEW_CHARS: usize = 50;

/// Document ingested when none is supplied
pub const SAMPLE_DOCUMENT: &str = "
    A llama is a domesticated South American camelid, widely used as a meat and pack animal by Andean cultures since the pre-Columbian era.
    Llamas are social animals and live in herds. The largest are the guanacos, which can weigh up to 300 pounds.
    Llamas can be quite calm and cooperative if they are raised correctly, which makes them great companions for people in the mountains.
    A female llama gives birth standing up. The gestation period for a llama is about 11.5 months.
    The llamas have long, thick necks, a small head with a cleft upper lip, and long ears.
";

/// Outcome of a successful ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionReport {
    pub chunks: usize,
    /// Width of the store's vector column; every stored embedding was checked against it
    pub dimension: usize,
}

/// Split `document` into trimmed, non-empty sentence fragments in document order.
///
/// This is deliberately naive: every terminator splits, including the one in
/// "11.5", and no overlap or length bound is applied.
#[inline]
pub fn split_sentences(document: &str) -> Vec<String> {
    document
        .split(SENTENCE_TERMINATORS)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Writes one record per sentence of a document
pub struct Ingestor<'a, E: Embedder> {
    embedder: &'a E,
    show_progress: bool,
}

impl<'a, E: Embedder> Ingestor<'a, E> {
    #[inline]
    pub fn new(embedder: &'a E) -> Self {
        Self {
            embedder,
            show_progress: console::user_attended_stderr(),
        }
    }

    #[inline]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Embed and store every chunk of `document`.
    ///
    /// All inserts share one transaction: the first failed embedding or
    /// insert aborts the run and nothing is committed.
    #[inline]
    pub async fn ingest(&self, store: &mut VectorStore, document: &str) -> Result<IngestionReport> {
        let chunks = split_sentences(document);
        info!("Ingesting {} chunks", chunks.len());

        let bar = if self.show_progress {
            ProgressBar::new(chunks.len() as u64).with_style(
                ProgressStyle::with_template("{spinner} [{pos}/{len}] Embedding {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            )
        } else {
            ProgressBar::hidden()
        };

        let dimension = store.dimension();
        let mut writer = store.writer().await?;

        for chunk in chunks {
            bar.set_message(preview(&chunk));
            bar.suspend(|| println!("Processing chunk: '{}...'", preview(&chunk)));

            let embedding = match self.embedder.embed(&chunk) {
                Ok(embedding) => embedding,
                Err(e) => {
                    bar.abandon();
                    return Err(e);
                }
            };
            let vector_len = embedding.len();

            let new_chunk = NewChunk {
                content: chunk,
                embedding,
            };
            if let Err(e) = writer.insert(&new_chunk).await {
                bar.abandon();
                return Err(e);
            }

            debug!("Inserted chunk {}", writer.inserted());
            bar.suspend(|| {
                println!(
                    "Inserted chunk into database. Vector dimension: {}",
                    style(vector_len).cyan()
                );
            });
            bar.inc(1);
        }

        let count = writer.commit().await?;
        bar.finish_and_clear();

        info!("Ingestion complete: {} chunks stored", count);
        Ok(IngestionReport {
            chunks: count,
            dimension,
        })
    }
}

/// First few characters of a chunk, for console output
fn preview(chunk: &str) -> String {
    chunk.chars().take(PREVIEW_CHARS).collect()
}
