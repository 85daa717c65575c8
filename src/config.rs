//! Configuration for chat sessions, the model endpoint and logging
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `CHAT_CONTEXT__<SECTION>__<KEY>` environment variables. A `.env` file is
//! honored when present.

use crate::error::{ContextError, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Environment prefix for overrides
pub const ENV_PREFIX: &str = "CHAT_CONTEXT";

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from an optional TOML file plus the environment
    pub fn load(path: Option<&str>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::with_name(path).required(false));
        }

        let config: Config = builder
            .add_source(Self::environment())
            .build()?
            .try_deserialize()?;

        config.finish()
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Config = ::config::Config::builder()
            .add_source(::config::File::from_str(source, ::config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.finish()
    }

    fn environment() -> ::config::Environment {
        ::config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    fn finish(mut self) -> Result<Self> {
        self.llm = self.llm.from_env();
        self.conversation.validate()?;
        self.llm.validate()?;
        Ok(self)
    }
}

/// Buffer limits and per-session prompt settings
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Maximum number of retained messages
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Maximum total characters across retained messages
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Maximum total whitespace-delimited words across retained messages
    #[serde(default = "default_max_words")]
    pub max_words: usize,

    /// Compact history every N user turns
    #[serde(default = "default_summarize_every")]
    pub summarize_every: u64,

    /// System message prepended to every completion request
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Model identifier for completion requests
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_max_messages() -> usize { 10 }
fn default_max_chars() -> usize { 5000 }
fn default_max_words() -> usize { 1000 }
fn default_summarize_every() -> u64 { 3 }
fn default_system_prompt() -> String { "You are helpful.".to_string() }
fn default_model() -> String { "llama-3.3-70b-versatile".to_string() }

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            max_chars: default_max_chars(),
            max_words: default_max_words(),
            summarize_every: default_summarize_every(),
            system_prompt: default_system_prompt(),
            model: default_model(),
        }
    }
}

impl ConversationConfig {
    /// Config with the given limits and default prompt settings
    pub fn with_limits(
        max_messages: usize,
        max_chars: usize,
        max_words: usize,
        summarize_every: u64,
    ) -> Self {
        Self {
            max_messages,
            max_chars,
            max_words,
            summarize_every,
            ..Self::default()
        }
    }

    /// All limits must be positive
    pub fn validate(&self) -> Result<()> {
        let zero = [
            ("max_messages", self.max_messages == 0),
            ("max_chars", self.max_chars == 0),
            ("max_words", self.max_words == 0),
            ("summarize_every", self.summarize_every == 0),
        ]
        .into_iter()
        .find(|(_, is_zero)| *is_zero);

        if let Some((field, _)) = zero {
            return Err(ContextError::Configuration(format!(
                "conversation.{} must be a positive integer",
                field
            )));
        }

        if self.model.trim().is_empty() {
            return Err(ContextError::Configuration(
                "conversation.model must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// OpenAI-compatible endpoint settings
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Chat completions URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token (falls back to GROQ_API_KEY / LLM_API_KEY)
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Model used by the summarizer and the extractor
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Total attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

fn default_endpoint() -> String { "https://api.groq.com/openai/v1/chat/completions".to_string() }
fn default_timeout_ms() -> u64 { 30_000 }
fn default_max_attempts() -> usize { 3 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl LlmConfig {
    /// Fill the API key from well-known environment variables when unset
    pub fn from_env(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = ["GROQ_API_KEY", "LLM_API_KEY"]
                .iter()
                .find_map(|name| std::env::var(name).ok())
                .filter(|key| !key.is_empty())
                .map(SecretString::new);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ContextError::Configuration(
                "llm.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}
