//! HTTP client with per-chunk retry logic.
//!
//! This module wraps a pooled `reqwest` client and implements the
//! per-chunk pipeline: build the request, POST it, parse the response,
//! retry with a fixed delay, and fall back to the original text once
//! every attempt has failed.

use crate::chunker::Chunk;
use crate::config::{ApiMode, Config};
use crate::error::{Result, SqueezeError};
use crate::request::{build_body, parse_chat, truncate, ChunkResult, StreamAccumulator};
use futures::StreamExt;
use reqwest::{header, Client};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, trace, warn};

/// HTTP client wrapper with retry logic.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: Arc<Config>,
    url: String,
}

impl ApiClient {
    /// Create a new API client from the run configuration.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.request.timeout)
            .pool_max_idle_per_host(config.request.workers)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .default_headers(headers)
            .build()
            .map_err(SqueezeError::HttpRequest)?;

        let url = config.api_url();

        Ok(Self {
            client,
            config,
            url,
        })
    }

    /// Process one chunk through the full retry pipeline.
    ///
    /// Always returns a result: on success the compressed text, after
    /// exhausting all attempts the original chunk text with the last error
    /// attached. Retry sleeps suspend only this worker.
    pub async fn compress_chunk(&self, chunk: Chunk) -> ChunkResult {
        let text = chunk.text().into_owned();
        let mut last_error = None;

        for attempt in 1..=self.config.retry.max_attempts {
            if attempt > 1 {
                sleep(self.config.retry.delay).await;
            }

            match self.send_once(&text).await {
                Ok(content) => {
                    return ChunkResult {
                        index: chunk.index,
                        content,
                        error: None,
                    };
                }
                Err(e) => {
                    debug!(
                        chunk = chunk.index,
                        attempt,
                        max_attempts = self.config.retry.max_attempts,
                        error = %e,
                        "Chunk attempt failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        warn!(
            chunk = chunk.index,
            attempts = self.config.retry.max_attempts,
            "All attempts failed, keeping original text"
        );

        ChunkResult {
            index: chunk.index,
            content: text,
            error: last_error,
        }
    }

    /// Send a single request and parse the response, without retries.
    async fn send_once(&self, chunk_text: &str) -> Result<String> {
        let body = build_body(self.config.mode, &self.config.model, chunk_text)?;

        trace!(url = %self.url, "Sending request");
        let response = self.client.post(&self.url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SqueezeError::EndpointError {
                status: status.as_u16(),
                body: truncate(&error_body, 500),
            });
        }

        match self.config.mode {
            ApiMode::Generate => {
                let mut acc = StreamAccumulator::new();
                let mut stream = response.bytes_stream();
                while let Some(piece) = stream.next().await {
                    acc.push(&piece?)?;
                    if acc.is_done() {
                        break;
                    }
                }
                acc.finish()
            }
            ApiMode::Chat => {
                let body = response.text().await?;
                parse_chat(&body)
            }
        }
    }
}
