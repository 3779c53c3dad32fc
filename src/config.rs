//! Configuration management for squeeze.
//!
//! Supports configuration via CLI arguments and environment variables
//! with defaults matching a stock local Ollama install.

use crate::error::{Result, SqueezeError};
use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments for the squeeze compressor.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "squeeze",
    version,
    about = "Compress large text files through a local LLM",
    long_about = "Squeeze splits a text file into fixed-size chunks, asks a local\n\
                  Ollama-compatible model to compress each chunk, and reassembles the\n\
                  responses in order. Chunks that fail after all retries fall back to\n\
                  their original text, so the output always covers the whole input.",
    after_help = "EXAMPLES:\n    \
        squeeze --input book.txt\n    \
        squeeze -i notes.txt -o compact.txt -m llama3.2 --api chat\n    \
        squeeze -i dump.txt -w 8 -c 8000 --url http://10.0.0.5:11434/api"
)]
pub struct Args {
    /// Path to the input text file
    #[arg(short, long, env = "SQUEEZE_INPUT")]
    pub input: PathBuf,

    /// Path to write the compressed output
    #[arg(short, long, default_value = "llm.txt", env = "SQUEEZE_OUTPUT")]
    pub output: PathBuf,

    /// Model name to use
    #[arg(
        short,
        long,
        default_value = "llama3.2-vision:latest",
        env = "SQUEEZE_MODEL"
    )]
    pub model: String,

    /// API endpoint mode
    #[arg(short, long, value_enum, default_value_t = ApiMode::Generate, env = "SQUEEZE_API")]
    pub api: ApiMode,

    /// Base URL of the model service
    #[arg(
        short,
        long,
        default_value = "http://localhost:11434/api",
        env = "SQUEEZE_URL"
    )]
    pub url: String,

    /// Maximum chunk size in bytes
    #[arg(short, long, default_value = "4000", env = "SQUEEZE_CHUNK_SIZE")]
    pub chunk_size: usize,

    /// Maximum concurrent requests
    #[arg(short, long, default_value = "3", env = "SQUEEZE_WORKERS")]
    pub workers: usize,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "120", env = "SQUEEZE_TIMEOUT")]
    pub timeout: u64,

    /// Maximum attempts per chunk
    #[arg(long, default_value = "3", env = "SQUEEZE_MAX_ATTEMPTS")]
    pub max_attempts: u32,

    /// Delay between retries in seconds
    #[arg(long, default_value = "2", env = "SQUEEZE_RETRY_DELAY")]
    pub retry_delay: u64,

    /// Enable verbose logging
    #[arg(short, long, env = "SQUEEZE_VERBOSE")]
    pub verbose: bool,

    /// Disable progress bars
    #[arg(long, env = "SQUEEZE_NO_PROGRESS")]
    pub no_progress: bool,
}

impl Args {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Which API surface of the model service to talk to.
///
/// Fixed for the whole run; selects both the request shape and the
/// response parsing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ApiMode {
    /// Streaming `/generate` endpoint (newline-delimited JSON).
    Generate,
    /// Single-document `/chat` endpoint.
    Chat,
}

impl ApiMode {
    /// URL path segment for this mode.
    pub fn path(self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Chat => "chat",
        }
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Full run configuration, immutable for the run's duration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model identifier sent with every request.
    pub model: String,

    /// Base URL of the model service (without the mode path).
    pub base_url: String,

    /// Endpoint mode.
    pub mode: ApiMode,

    /// Maximum chunk size in bytes.
    pub chunk_size: usize,

    /// Request settings.
    pub request: RequestConfig,

    /// Retry settings.
    pub retry: RetryConfig,
}

/// Request-specific configuration.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Per-attempt request timeout.
    pub timeout: Duration,

    /// Maximum concurrent in-flight requests.
    pub workers: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            workers: default_workers(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_workers() -> usize {
    3
}

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts per chunk.
    pub max_attempts: u32,

    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay: default_retry_delay(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(2)
}

impl Config {
    /// Create configuration from CLI arguments.
    pub fn from_args(args: &Args) -> Result<Self> {
        let config = Self {
            model: args.model.clone(),
            base_url: args.url.clone(),
            mode: args.api,
            chunk_size: args.chunk_size,
            request: RequestConfig {
                timeout: Duration::from_secs(args.timeout),
                workers: args.workers,
            },
            retry: RetryConfig {
                max_attempts: args.max_attempts,
                delay: Duration::from_secs(args.retry_delay),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(SqueezeError::InvalidConfig(
                "base URL cannot be empty".to_string(),
            ));
        }
        if self.model.is_empty() {
            return Err(SqueezeError::InvalidConfig(
                "model name cannot be empty".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(SqueezeError::InvalidConfig(
                "chunk size must be greater than 0".to_string(),
            ));
        }
        if self.request.workers == 0 {
            return Err(SqueezeError::InvalidConfig(
                "workers must be greater than 0".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(SqueezeError::InvalidConfig(
                "max attempts must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Full URL of the selected endpoint.
    pub fn api_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.mode.path())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "llama3.2-vision:latest".to_string(),
            base_url: "http://localhost:11434/api".to_string(),
            mode: ApiMode::Generate,
            chunk_size: 4000,
            request: RequestConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}
