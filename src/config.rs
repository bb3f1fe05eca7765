use std::env;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the relay server and CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key sent as a bearer token to the AI provider.
    pub openai_api_key: String,
    /// Base URL of the provider REST API (including the `/v1` prefix).
    pub openai_base_url: String,
    /// Model used for category extraction and candidate summaries.
    pub chat_model: String,
    /// Model backing the file-search assistant.
    pub assistant_model: String,
    /// Embedding provider used to generate vector representations.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Base URL of the Qdrant instance that stores embeddings.
    pub qdrant_url: String,
    /// Name of the Qdrant collection holding resume entries.
    pub qdrant_collection_name: String,
    /// Optional API key required to access Qdrant.
    pub qdrant_api_key: Option<String>,
    /// Location of the resume corpus.
    pub resume_csv_path: String,
    /// Keep every N-th corpus row during ingestion.
    pub resume_sample_every: usize,
    /// Fixed delay between job status queries, in milliseconds.
    pub poll_interval_ms: u64,
    /// Budget for a job to reach a terminal state, in milliseconds. `POLL_TIMEOUT_MS` must be
    /// positive; `None` is only reachable programmatically and polls until a terminal state.
    pub poll_timeout_ms: Option<u64>,
    /// Results requested per similarity search.
    pub search_top_k: usize,
    /// Minimum score (exclusive) accepted by the plain top-K strategy.
    pub search_score_threshold: f32,
    /// Maximum number of candidates returned by a query.
    pub search_max_candidates: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Supported embedding backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// Hosted OpenAI embeddings API.
    OpenAI,
    /// Deterministic local hashing embeddings, useful offline.
    Local,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            openai_api_key: load_env("OPENAI_API_KEY")?,
            openai_base_url: load_env_optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            chat_model: load_env_or("CHAT_MODEL", "gpt-4o"),
            assistant_model: load_env_or("ASSISTANT_MODEL", "gpt-4o-mini"),
            embedding_provider: load_env_or("EMBEDDING_PROVIDER", "openai")
                .parse()
                .map_err(|()| ConfigError::InvalidValue("EMBEDDING_PROVIDER".to_string()))?,
            embedding_model: load_env_or("EMBEDDING_MODEL", "text-embedding-ada-002"),
            embedding_dimension: parse_env_or("EMBEDDING_DIMENSION", 1536)?,
            qdrant_url: load_env("QDRANT_URL")?,
            qdrant_collection_name: load_env_or("QDRANT_COLLECTION_NAME", "resumes"),
            qdrant_api_key: load_env_optional("QDRANT_API_KEY"),
            resume_csv_path: load_env_or("RESUME_CSV_PATH", "public/Resume.csv"),
            resume_sample_every: parse_env_or("RESUME_SAMPLE_EVERY", 50)?,
            poll_interval_ms: parse_env_or("POLL_INTERVAL_MS", 5_000)?,
            poll_timeout_ms: Some(positive(
                "POLL_TIMEOUT_MS",
                parse_env_or("POLL_TIMEOUT_MS", 120_000)?,
            )?),
            search_top_k: parse_env_or("SEARCH_TOP_K", 10)?,
            search_score_threshold: parse_env_or("SEARCH_SCORE_THRESHOLD", 0.75)?,
            search_max_candidates: parse_env_or("SEARCH_MAX_CANDIDATES", 10)?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }

    /// Interval between job status queries.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Optional overall polling budget; `None` polls until a terminal state.
    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout_ms.map(Duration::from_millis)
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_or(key: &str, default: &str) -> String {
    load_env_optional(key).unwrap_or_else(|| default.to_string())
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn positive(key: &str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue(key.to_string()));
    }
    Ok(value)
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "local" => Ok(Self::Local),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        openai_base_url = %config.openai_base_url,
        chat_model = %config.chat_model,
        qdrant_url = %config.qdrant_url,
        collection = %config.qdrant_collection_name,
        server_port = ?config.server_port,
        embedding_provider = ?config.embedding_provider,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}

/// Fully populated configuration for unit tests.
#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        openai_api_key: "sk-test".into(),
        openai_base_url: DEFAULT_OPENAI_BASE_URL.into(),
        chat_model: "gpt-4o".into(),
        assistant_model: "gpt-4o-mini".into(),
        embedding_provider: EmbeddingProvider::Local,
        embedding_model: "text-embedding-ada-002".into(),
        embedding_dimension: 8,
        qdrant_url: "http://127.0.0.1:6333".into(),
        qdrant_collection_name: "resumes".into(),
        qdrant_api_key: None,
        resume_csv_path: "public/Resume.csv".into(),
        resume_sample_every: 50,
        poll_interval_ms: 5_000,
        poll_timeout_ms: Some(120_000),
        search_top_k: 10,
        search_score_threshold: 0.75,
        search_max_candidates: 10,
        server_port: None,
    }
}
