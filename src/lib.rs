//! # Squeeze
//!
//! Chunked text compression through a local LLM.
//!
//! Squeeze splits a text file into fixed-size byte chunks, sends each chunk
//! to an Ollama-compatible HTTP service with a compression prompt, and
//! reassembles the responses in their original order.
//!
//! ## Features
//!
//! - **Bounded Concurrency**: at most K chunks in flight at any instant
//! - **Automatic Retries**: fixed-delay retries per chunk, local to the worker
//! - **Graceful Degradation**: a chunk that fails every attempt keeps its
//!   original text, so the output always covers the whole input
//! - **Two API Modes**: streaming `generate` and single-document `chat`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use squeeze::{ApiMode, Config, Processor};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config {
//!         model: "llama3.2".to_string(),
//!         mode: ApiMode::Generate,
//!         ..Default::default()
//!     };
//!
//!     let processor = Processor::new(config)?;
//!     let summary = processor
//!         .run(Path::new("book.txt"), Path::new("llm.txt"), true)
//!         .await?;
//!
//!     summary.print_summary();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chunker;
pub mod client;
pub mod config;
pub mod error;
pub mod processor;
pub mod request;
pub mod tracker;

// Re-exports for convenience
pub use chunker::{Chunk, Chunker};
pub use client::ApiClient;
pub use config::{ApiMode, Args, Config, RequestConfig, RetryConfig};
pub use error::{Result, SqueezeError};
pub use processor::{Processor, RunSummary};
pub use request::{ChatMessage, ChunkResult, StreamAccumulator};
pub use tracker::{StatsSnapshot, StatsTracker};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
