use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct WreckConfig {
    pub server: ServerConfig,
    pub corpus: CorpusConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub retrieval: RetrievalConfig,
    pub lightning: LightningConfig,
    /// Server-side fallback credential. Only ever read from `OPENAI_API_KEY`.
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CorpusConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub max_input_tokens: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationConfig {
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub max_prompt_tokens: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_matches: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LightningConfig {
    pub address: Option<String>,
    pub amount_msat: u64,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            log_level: "info".into(),
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        let path = default_wreck_dir()
            .join("corpus.json")
            .to_string_lossy()
            .into_owned();
        Self { path }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            base_url: "https://api.openai.com/v1".into(),
            model: "text-embedding-ada-002".into(),
            max_input_tokens: 8191,
            timeout_secs: 30,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-3.5-turbo".into(),
            system_prompt: "You are a helpful assistant that accurately answers queries using \
                            the supplied passages. Use the text provided to form your answer, \
                            but avoid copying word-for-word. Be accurate, helpful, concise, \
                            and clear."
                .into(),
            temperature: 0.0,
            max_tokens: 150,
            max_prompt_tokens: 3000,
            timeout_secs: 30,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { default_matches: 5 }
    }
}

impl Default for LightningConfig {
    fn default() -> Self {
        Self {
            address: None,
            amount_msat: 1_000_000,
            timeout_secs: 15,
        }
    }
}

/// Returns `~/.wreck/`, or `./.wreck/` when no home directory is known.
pub fn default_wreck_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".wreck")
}

/// Returns the default config file path: `~/.wreck/config.toml`
pub fn default_config_path() -> PathBuf {
    default_wreck_dir().join("config.toml")
}

impl WreckConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            WreckConfig::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides (WRECK_CORPUS, WRECK_HOST, WRECK_PORT,
    /// WRECK_LOG_LEVEL, WRECK_LN_ADDRESS, OPENAI_API_KEY).
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("WRECK_CORPUS") {
            self.corpus.path = val;
        }
        if let Ok(val) = std::env::var("WRECK_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("WRECK_PORT") {
            self.server.port = val
                .parse()
                .with_context(|| format!("WRECK_PORT is not a valid port: {val}"))?;
        }
        if let Ok(val) = std::env::var("WRECK_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("WRECK_LN_ADDRESS") {
            self.lightning.address = Some(val);
        }
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            if !val.trim().is_empty() {
                self.api_key = Some(val);
            }
        }
        Ok(())
    }

    /// Resolve the corpus path, expanding `~` if needed.
    pub fn resolved_corpus_path(&self) -> PathBuf {
        expand_tilde(&self.corpus.path)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
