
use tracing::{debug, info};

use crate::Result;
use crate::config::RetrievalConfig;
use crate::database::postgres::VectorStore;
use crate::database::postgres::models::ScoredChunk;
use crate::ollama::{Embedder, FragmentSink, Generator};

/// Question asked when none is supplied
pub const DEFAULT_QUESTION: &str = "What makes a llama a good companion?";

/// Outcome of one retrieval-augmented query
#[derive(Debug, Clone, PartialEq)]
pub struct RagAnswer {
    pub question: String,
    pub retrieved: Vec<ScoredChunk>,
    pub answer: String,
}

/// Join retrieved chunk texts with single spaces
#[inline]
pub fn build_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[inline]
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Based on the provided context, answer the question clearly and helpfully. \
         Use only information from the context.\n\n\
         Context: {context}\n\n\
         Question: {question}\n\n\
         Answer:"
    )
}

/// Embeds a question, retrieves its nearest chunks and streams an answer
pub struct QueryRunner<'a, E: Embedder, G: Generator> {
    embedder: &'a E,
    generator: &'a G,
    retrieval: RetrievalConfig,
}

impl<'a, E: Embedder, G: Generator> QueryRunner<'a, E, G> {
    #[inline]
    pub fn new(embedder: &'a E, generator: &'a G, retrieval: RetrievalConfig) -> Self {
        Self {
            embedder,
            generator,
            retrieval,
        }
    }

    /// Nearest stored chunks for `question`, closest first
    #[inline]
    pub async fn retrieve(
        &self,
        store: &mut VectorStore,
        question: &str,
    ) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self.embedder.embed(question)?;

        let retrieved = store
            .nearest(
                &query_embedding,
                self.retrieval.distance,
                self.retrieval.top_k,
            )
            .await?;

        info!(
            "Retrieved {} chunks by {} distance",
            retrieved.len(),
            self.retrieval.distance
        );
        Ok(retrieved)
    }

    /// Run the whole query.
    ///
    /// `on_retrieved` sees the ranked chunks before generation starts and
    /// `on_fragment` receives generated text as it streams in. Any failure
    /// aborts without an answer.
    #[inline]
    pub async fn run(
        &self,
        store: &mut VectorStore,
        question: &str,
        on_retrieved: impl FnOnce(&[ScoredChunk]) + Send,
        on_fragment: &mut FragmentSink<'_>,
    ) -> Result<RagAnswer> {
        let retrieved = self.retrieve(store, question).await?;
        on_retrieved(&retrieved);

        let context = build_context(&retrieved);
        let prompt = build_prompt(&context, question);
        debug!("Prompt is {} characters", prompt.len());

        let answer = self.generator.generate_stream(&prompt, on_fragment)?;

        Ok(RagAnswer {
            question: question.to_string(),
            retrieved,
            answer,
        })
    }
}
