#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests that require a local Ollama instance with the models pulled.
// Run with: cargo test --test integration_ollama -- --ignored

use ollama_pg_rag::config::OllamaConfig;
use ollama_pg_rag::ollama::{Embedder, Generator, OllamaClient};
use std::env;
use std::time::Duration;
use tracing::info;

fn create_integration_test_client() -> OllamaClient {
    let defaults = OllamaConfig::default();
    let config = OllamaConfig {
        host: env::var("OLLAMA_HOST").unwrap_or_else(|_| defaults.host.clone()),
        port: env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port),
        embedding_model: env::var("OLLAMA_EMBEDDING_MODEL")
            .unwrap_or_else(|_| defaults.embedding_model.clone()),
        generation_model: env::var("OLLAMA_GENERATION_MODEL")
            .unwrap_or_else(|_| defaults.generation_model.clone()),
        ..defaults
    };

    OllamaClient::new(&config)
        .expect("Failed to create Ollama client")
        .with_timeout(Duration::from_secs(120))
}

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok(); // Ignore error if already initialized
}

#[test]
#[ignore = "requires a running Ollama with nomic-embed-text"]
fn real_ollama_embedding_has_model_width() {
    init_test_tracing();

    let client = create_integration_test_client();
    let embedding = client
        .embed("Llamas are social animals and live in herds")
        .expect("embedding should succeed");

    info!("Embedding has {} dimensions", embedding.len());
    assert_eq!(
        embedding.len(),
        OllamaConfig::default().embedding_dimension as usize
    );
}

#[test]
#[ignore = "requires a running Ollama with nomic-embed-text"]
fn real_ollama_embeddings_are_deterministic() {
    init_test_tracing();

    let client = create_integration_test_client();
    let text = "A female llama gives birth standing up";
    let first = client.embed(text).expect("embedding should succeed");
    let second = client.embed(text).expect("embedding should succeed");

    assert_eq!(first, second);
}

#[test]
#[ignore = "requires a running Ollama with gemma3:270m"]
fn real_ollama_generation_streams() {
    init_test_tracing();

    let client = create_integration_test_client();
    let mut fragments = 0;
    let answer = client
        .generate_stream("Reply with one word: hello", &mut |_| {
            fragments += 1;
            Ok(())
        })
        .expect("generation should succeed");

    info!("Received {} fragments", fragments);
    assert!(!answer.is_empty());
    assert!(fragments >= 1);
}
