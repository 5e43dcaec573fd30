use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.database.host, "localhost");
    assert_eq!(config.database.port, 5432);
    assert_eq!(config.database.name, "rag_db");
    assert_eq!(config.database.user, "rag_user");
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.embedding_model, "nomic-embed-text");
    assert_eq!(config.ollama.generation_model, "gemma3:270m");
    assert_eq!(config.ollama.embedding_dimension, 768);
    assert_eq!(config.ollama.timeout_seconds, None);
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.retrieval.distance, DistanceMetric::Cosine);
    assert!(config.validate().is_ok());
}

#[test]
fn config_validation() {
    let config = Config::default();

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidProtocol(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidPort(0))
    ));

    let mut invalid_config = config.clone();
    invalid_config.ollama.embedding_model = "   ".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidModel(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.ollama.generation_model = String::new();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidModel(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.ollama.embedding_dimension = 0;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidEmbeddingDimension(0))
    ));

    let mut invalid_config = config.clone();
    invalid_config.ollama.embedding_dimension = 16_001;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.retrieval.top_k = 0;
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidTopK(0))
    ));

    let mut invalid_config = config.clone();
    invalid_config.database.name = String::new();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidDatabaseName(_))
    ));

    let mut invalid_config = config.clone();
    invalid_config.database.user = " ".to_string();
    assert!(matches!(
        invalid_config.validate(),
        Err(ConfigError::InvalidDatabaseUser(_))
    ));

    let mut invalid_config = config;
    invalid_config.database.port = 0;
    assert!(invalid_config.validate().is_err());
}

#[test]
fn empty_ollama_host_is_rejected() {
    let mut config = Config::default();
    config.ollama.host = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn ollama_url_generation() {
    let config = Config::default();
    let url = config
        .ollama_url()
        .expect("should generate ollama_url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn https_url_generation() {
    let mut config = Config::default();
    config.ollama.protocol = "https".to_string();
    config.ollama.host = "secure.example.com".to_string();
    config.ollama.port = 443;

    let url = config
        .ollama_url()
        .expect("should generate https url successfully");
    assert_eq!(url.as_str(), "https://secure.example.com/");
}

#[test]
fn database_address() {
    let config = DatabaseConfig::default();
    assert_eq!(config.address(), "localhost:5432/rag_db");
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn partial_config_uses_defaults() {
    let partial_toml = r#"
        [database]
        host = "db.internal"

        [retrieval]
        distance = "l2"
    "#;

    let config: Config = toml::from_str(partial_toml).expect("should parse partial toml");
    assert_eq!(config.database.host, "db.internal");
    assert_eq!(config.database.port, 5432);
    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.retrieval.distance, DistanceMetric::L2);
}

#[test]
fn unknown_distance_is_rejected() {
    let toml_str = r#"
        [retrieval]
        distance = "manhattan"
    "#;

    let result: Result<Config, toml::de::Error> = toml::from_str(toml_str);
    assert!(result.is_err());
}

#[test]
fn load_missing_config_returns_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("should load defaults");
    assert_eq!(config.database, DatabaseConfig::default());
    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.get_base_dir(), temp_dir.path());
}

#[test]
fn save_and_load_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let mut config = Config {
        base_dir: temp_dir.path().join("nested"),
        ..Config::default()
    };
    config.ollama.timeout_seconds = Some(120);
    config.retrieval.top_k = 5;
    config.retrieval.distance = DistanceMetric::InnerProduct;

    config.save().expect("should save config");
    assert!(config.config_file_path().exists());

    let loaded = Config::load(temp_dir.path().join("nested")).expect("should load config");
    assert_eq!(loaded, config);
}

#[test]
fn load_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(
        temp_dir.path().join("config.toml"),
        "[ollama]\nembedding_dimension = 0\n",
    )
    .expect("should write config");

    assert!(matches!(
        Config::load(temp_dir.path()),
        Err(ConfigError::InvalidEmbeddingDimension(0))
    ));
}

#[test]
fn load_reports_malformed_toml_with_path() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[ollama\nport = 11434\n").expect("should write config");

    match Config::load(temp_dir.path()) {
        Err(ConfigError::Parse { path, .. }) => assert_eq!(path, config_path),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn save_rejects_invalid_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    config.retrieval.top_k = 1000;

    assert!(config.save().is_err());
    assert!(!config.config_file_path().exists());
}

#[test]
fn redacted_masks_password() {
    let config = Config::default();
    let redacted = config.redacted();
    assert_eq!(redacted.database.password, "********");
    assert_eq!(redacted.database.user, config.database.user);
    assert_eq!(config.database.password, "password");

    let mut no_password = Config::default();
    no_password.database.password = String::new();
    assert_eq!(no_password.redacted().database.password, "");
}

#[test]
fn error_display_messages() {
    let errors = vec![
        ConfigError::InvalidProtocol("ftp".to_string()),
        ConfigError::InvalidPort(0),
        ConfigError::InvalidModel(String::new()),
        ConfigError::InvalidUrl("invalid-url".to_string()),
        ConfigError::InvalidEmbeddingDimension(0),
        ConfigError::InvalidTopK(0),
    ];

    for error in errors {
        let message = format!("{error}");
        assert!(message.len() > 10);
    }
}
