
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::OllamaConfig;
use crate::{RagError, Result};

/// Receives generated text fragments in order
pub type FragmentSink<'a> = dyn FnMut(&str) -> Result<()> + Send + 'a;

/// Turns text into an embedding vector
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Produces an answer for a prompt, handing each fragment to `on_fragment` as it arrives
pub trait Generator: Send + Sync {
    fn generate_stream(
        &self,
        prompt: &str,
        on_fragment: &mut FragmentSink<'_>,
    ) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    embedding_model: String,
    generation_model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// One line of the newline-delimited `/api/generate` stream
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Service {
    Embedding,
    Generation,
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let base_url = config.ollama_url()?;

        Ok(Self {
            base_url,
            embedding_model: config.embedding_model.clone(),
            generation_model: config.generation_model.clone(),
            agent: build_agent(config.timeout_seconds.map(Duration::from_secs)),
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(Some(timeout));
        self
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[inline]
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    #[inline]
    pub fn generation_model(&self) -> &str {
        &self.generation_model
    }

    /// Request an embedding for a single text
    #[inline]
    pub fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        debug!(
            "Generating embedding with {} (text length: {})",
            self.embedding_model,
            text.len()
        );

        let request = EmbeddingRequest {
            model: &self.embedding_model,
            prompt: text,
        };
        let request_json = serde_json::to_string(&request).map_err(|e| {
            RagError::Embedding(format!("Failed to serialize embedding request: {e}"))
        })?;

        let url = self.endpoint("/api/embeddings", Service::Embedding)?;

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| self.request_error(e, Service::Embedding))?;

        let response: EmbeddingResponse = serde_json::from_str(&response_text).map_err(|e| {
            RagError::Embedding(format!("Failed to parse embedding response: {e}"))
        })?;

        if response.embedding.is_empty() {
            return Err(RagError::Embedding(format!(
                "Model '{}' returned an empty embedding",
                self.embedding_model
            )));
        }

        debug!(
            "Generated embedding with {} dimensions",
            response.embedding.len()
        );
        Ok(response.embedding)
    }

    /// Stream a completion from the generation model
    #[inline]
    pub fn generate(
        &self,
        prompt: &str,
        on_fragment: &mut FragmentSink<'_>,
    ) -> Result<String> {
        debug!(
            "Generating response with {} (prompt length: {})",
            self.generation_model,
            prompt.len()
        );

        let request = GenerateRequest {
            model: &self.generation_model,
            prompt,
            stream: true,
        };
        let request_json = serde_json::to_string(&request).map_err(|e| {
            RagError::Generation(format!("Failed to serialize generate request: {e}"))
        })?;

        let url = self.endpoint("/api/generate", Service::Generation)?;

        let response = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .map_err(|e| self.request_error(e, Service::Generation))?;

        let reader = BufReader::new(response.into_body().into_reader());
        read_generate_stream(reader, on_fragment)
    }

    fn endpoint(&self, path: &str, service: Service) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| service.error(format!("Failed to build {path} URL: {e}")))
    }

    fn request_error(&self, error: ureq::Error, service: Service) -> RagError {
        let model = match service {
            Service::Embedding => &self.embedding_model,
            Service::Generation => &self.generation_model,
        };

        match error {
            ureq::Error::StatusCode(404) => {
                warn!("Ollama reported model {} as missing", model);
                service.error(format!(
                    "Model '{model}' is not available (HTTP 404). Pull it with `ollama pull {model}`"
                ))
            }
            ureq::Error::StatusCode(status) => {
                service.error(format!("Ollama returned HTTP {status} for model '{model}'"))
            }
            ureq::Error::ConnectionFailed
            | ureq::Error::HostNotFound
            | ureq::Error::Timeout(_)
            | ureq::Error::Io(_) => RagError::ModelServiceUnavailable {
                url: self.base_url.to_string(),
                message: error.to_string(),
            },
            other => service.error(format!("Request to Ollama failed: {other}")),
        }
    }
}

impl Embedder for OllamaClient {
    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.generate_embedding(text)
    }
}

impl Generator for OllamaClient {
    #[inline]
    fn generate_stream(
        &self,
        prompt: &str,
        on_fragment: &mut FragmentSink<'_>,
    ) -> Result<String> {
        self.generate(prompt, on_fragment)
    }
}

impl Service {
    fn error(self, message: String) -> RagError {
        match self {
            Service::Embedding => RagError::Embedding(message),
            Service::Generation => RagError::Generation(message),
        }
    }
}

fn build_agent(timeout: Option<Duration>) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(timeout)
        .build()
        .into()
}

/// Consume a newline-delimited generate stream until the model signals completion
fn read_generate_stream<R: BufRead>(
    reader: R,
    on_fragment: &mut FragmentSink<'_>,
) -> Result<String> {
    let mut answer = String::new();
    let mut completed = false;

    for line in reader.lines() {
        let line = line.map_err(|e| RagError::Generation(format!("Stream read failed: {e}")))?;
        if line.trim().is_empty() {
            continue;
        }

        let chunk: GenerateChunk = serde_json::from_str(&line)
            .map_err(|e| RagError::Generation(format!("Malformed stream line: {e}")))?;

        if let Some(error) = chunk.error {
            return Err(RagError::Generation(error));
        }

        if !chunk.response.is_empty() {
            on_fragment(&chunk.response)?;
            answer.push_str(&chunk.response);
        }

        if chunk.done {
            completed = true;
            break;
        }
    }

    if !completed {
        warn!("Generation stream ended without a completion marker");
    }

    debug!("Generated {} characters", answer.len());
    Ok(answer)
}
