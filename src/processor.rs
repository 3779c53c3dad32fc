//! Pipeline orchestration: chunk, fan out, reassemble.
//!
//! This module coordinates reading the input file, distributing chunks
//! across a bounded pool of concurrent requests, and writing the
//! reassembled output with a run summary.

use crate::chunker::{chunk_count, Chunk, Chunker};
use crate::client::ApiClient;
use crate::config::Config;
use crate::error::{Result, SqueezeError};
use crate::request::ChunkResult;
use crate::tracker::StatsTracker;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tracing::{info, warn};

/// Separator between chunks in the assembled output.
const CHUNK_SEPARATOR: &str = "\n\n";

/// Orchestrates one compression run.
pub struct Processor {
    config: Arc<Config>,
    client: ApiClient,
    stats: Arc<StatsTracker>,
}

impl Processor {
    /// Create a new processor.
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let client = ApiClient::new(Arc::clone(&config))?;
        let stats = Arc::new(StatsTracker::new());

        Ok(Self {
            config,
            client,
            stats,
        })
    }

    /// Compress `input` into `output`.
    ///
    /// Per-chunk failures are absorbed: failed chunks keep their original
    /// text and the run still writes output. Only setup errors (unreadable
    /// input, unwritable output) abort.
    pub async fn run(
        &self,
        input: &Path,
        output: &Path,
        show_progress: bool,
    ) -> Result<RunSummary> {
        let start = Instant::now();

        let metadata = tokio::fs::metadata(input)
            .await
            .map_err(|e| SqueezeError::InputFileRead {
                path: input.to_path_buf(),
                source: e,
            })?;
        let input_bytes = metadata.len();

        let chunks = self.chunk_input(input, input_bytes, show_progress).await?;
        let total_chunks = chunks.len();

        info!(
            total_chunks,
            chunk_size = self.config.chunk_size,
            workers = self.config.request.workers,
            "Split input into chunks"
        );

        let results = self.process_chunks(chunks, show_progress).await;

        let failure_count = results.iter().filter(|r| !r.is_success()).count();
        let success_count = total_chunks - failure_count;
        if failure_count > 0 {
            warn!(failure_count, "Some chunks kept their original text");
        }

        let content = assemble(results);
        write_output(output, &content).await?;

        let snapshot = self.stats.snapshot();
        Ok(RunSummary {
            total_chunks,
            success_count,
            failure_count,
            input_bytes,
            output_bytes: content.len() as u64,
            elapsed: start.elapsed(),
            avg_latency_ms: snapshot.avg_latency_ms,
        })
    }

    /// Read the input file into ordered chunks.
    async fn chunk_input(
        &self,
        input: &Path,
        input_bytes: u64,
        show_progress: bool,
    ) -> Result<Vec<Chunk>> {
        let file = File::open(input)
            .await
            .map_err(|e| SqueezeError::InputFileRead {
                path: input.to_path_buf(),
                source: e,
            })?;

        let progress = if show_progress {
            let pb = ProgressBar::new(chunk_count(input_bytes, self.config.chunk_size));
            pb.set_style(bar_style());
            pb.set_message("chunking");
            Some(pb)
        } else {
            None
        };

        let chunker = Chunker::new(file, self.config.chunk_size);
        let chunks = chunker
            .read_all(|_| {
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
            })
            .await
            .map_err(|e| SqueezeError::InputFileRead {
                path: input.to_path_buf(),
                source: e,
            })?;

        if let Some(pb) = &progress {
            pb.finish_and_clear();
        }

        Ok(chunks)
    }

    /// Fan chunks out to the bounded worker pool.
    async fn process_chunks(&self, chunks: Vec<Chunk>, show_progress: bool) -> Vec<ChunkResult> {
        let progress = if show_progress {
            let pb = ProgressBar::new(chunks.len() as u64);
            pb.set_style(bar_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            Some(pb)
        } else {
            None
        };

        let client = &self.client;
        let stats = &self.stats;
        let results = run_pool(chunks, self.config.request.workers, |chunk| {
            let client = client.clone();
            let stats = Arc::clone(stats);
            let progress = progress.clone();

            async move {
                let started = Instant::now();
                let result = client.compress_chunk(chunk).await;

                if result.is_success() {
                    stats.record_success(started.elapsed());
                } else {
                    stats.record_failure();
                }

                if let Some(pb) = &progress {
                    let snapshot = stats.snapshot();
                    pb.set_message(format!(
                        "ok: {} | failed: {} | {:.0} chunk/s | avg {:.0}ms",
                        snapshot.success_count,
                        snapshot.failure_count,
                        snapshot.current_rate,
                        snapshot.avg_latency_ms
                    ));
                    pb.inc(1);
                }

                result
            }
        })
        .await;

        if let Some(pb) = &progress {
            pb.finish_with_message("done");
        }

        results
    }
}

/// Run `op` over every chunk with at most `workers` invocations in flight.
///
/// Results come back in completion order, each tagged with its origin
/// index; every chunk produces exactly one result. The `collect` acts as
/// the completion barrier, and a future's slot in the concurrency window
/// is freed on every exit path because completion itself vacates it.
pub async fn run_pool<F, Fut>(chunks: Vec<Chunk>, workers: usize, op: F) -> Vec<ChunkResult>
where
    F: Fn(Chunk) -> Fut,
    Fut: Future<Output = ChunkResult>,
{
    stream::iter(chunks)
        .map(|chunk| op(chunk))
        .buffer_unordered(workers.max(1))
        .collect()
        .await
}

/// Join results into the final text in strictly ascending index order.
pub fn assemble(mut results: Vec<ChunkResult>) -> String {
    results.sort_unstable_by_key(|r| r.index);
    debug_assert!(results.iter().enumerate().all(|(i, r)| r.index == i));

    let parts: Vec<&str> = results.iter().map(|r| r.content.as_str()).collect();
    parts.join(CHUNK_SEPARATOR)
}

/// Write the assembled text, creating parent directories as needed.
async fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SqueezeError::OutputFileWrite {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    tokio::fs::write(path, content)
        .await
        .map_err(|e| SqueezeError::OutputFileWrite {
            path: path.to_path_buf(),
            source: e,
        })
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) | {msg}")
        .unwrap()
        .progress_chars("█▓▒░")
}

/// Result of one compression run.
#[derive(Debug)]
pub struct RunSummary {
    /// Total chunks processed.
    pub total_chunks: usize,
    /// Chunks compressed successfully.
    pub success_count: usize,
    /// Chunks that fell back to their original text.
    pub failure_count: usize,
    /// Input size in bytes.
    pub input_bytes: u64,
    /// Output size in bytes.
    pub output_bytes: u64,
    /// Total elapsed time.
    pub elapsed: Duration,
    /// Average latency of successful chunks in milliseconds.
    pub avg_latency_ms: f64,
}

impl RunSummary {
    /// Success rate as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.total_chunks > 0 {
            (self.success_count as f64 / self.total_chunks as f64) * 100.0
        } else {
            100.0
        }
    }

    /// Input bytes over output bytes; `None` when the output is empty.
    pub fn compression_ratio(&self) -> Option<f64> {
        if self.output_bytes > 0 {
            Some(self.input_bytes as f64 / self.output_bytes as f64)
        } else {
            None
        }
    }

    /// Print a summary of the run.
    pub fn print_summary(&self) {
        println!("\n{}", "═".repeat(60));
        println!("                   COMPRESSION COMPLETE");
        println!("{}", "═".repeat(60));
        println!("  Chunks:           {}", self.total_chunks);
        println!(
            "  Successful:       {} ({:.1}%)",
            self.success_count,
            self.success_rate()
        );
        println!("  Failed:           {}", self.failure_count);
        println!("  Elapsed Time:     {:.2}s", self.elapsed.as_secs_f64());
        println!("  Avg Latency:      {:.1}ms", self.avg_latency_ms);
        if let Some(ratio) = self.compression_ratio() {
            println!(
                "  Compression:      {:.2}x (from {:.2} MB to {:.2} MB)",
                ratio,
                mb(self.input_bytes),
                mb(self.output_bytes)
            );
        }
        println!("{}", "═".repeat(60));
    }
}

fn mb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiMode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            index,
            data: text.as_bytes().to_vec(),
        }
    }

    fn ok_result(index: usize, content: &str) -> ChunkResult {
        ChunkResult {
            index,
            content: content.to_string(),
            error: None,
        }
    }

    #[tokio::test]
    async fn test_pool_produces_every_index_exactly_once() {
        let chunks: Vec<Chunk> = (0..25).map(|i| chunk(i, "x")).collect();

        let results = run_pool(chunks, 4, |c| async move {
            ok_result(c.index, &format!("r{}", c.index))
        })
        .await;

        assert_eq!(results.len(), 25);
        let mut indices: Vec<usize> = results.iter().map(|r| r.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..25).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_pool_never_exceeds_worker_limit() {
        let workers = 3;
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let chunks: Vec<Chunk> = (0..20).map(|i| chunk(i, "x")).collect();
        let results = run_pool(chunks, workers, |c| {
            let active = Arc::clone(&active);
            let max_seen = Arc::clone(&max_seen);
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                ok_result(c.index, "done")
            }
        })
        .await;

        assert_eq!(results.len(), 20);
        assert!(max_seen.load(Ordering::SeqCst) <= workers);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pool_with_zero_workers_still_completes() {
        let chunks = vec![chunk(0, "a"), chunk(1, "b")];
        let results = run_pool(chunks, 0, |c| async move { ok_result(c.index, "r") }).await;
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_assemble_orders_by_index() {
        let results = vec![ok_result(2, "C"), ok_result(0, "A"), ok_result(1, "B")];
        assert_eq!(assemble(results), "A\n\nB\n\nC");
    }

    #[test]
    fn test_assemble_single_chunk_has_no_separator() {
        let results = vec![ok_result(0, "only")];
        assert_eq!(assemble(results), "only");
    }

    #[test]
    fn test_assemble_empty() {
        assert_eq!(assemble(Vec::new()), "");
    }

    #[test]
    fn test_compression_ratio() {
        let summary = RunSummary {
            total_chunks: 1,
            success_count: 1,
            failure_count: 0,
            input_bytes: 1000,
            output_bytes: 250,
            elapsed: Duration::from_secs(1),
            avg_latency_ms: 10.0,
        };
        assert_eq!(summary.compression_ratio(), Some(4.0));
        assert_eq!(summary.success_rate(), 100.0);
    }

    #[test]
    fn test_no_ratio_for_empty_output() {
        let summary = RunSummary {
            total_chunks: 0,
            success_count: 0,
            failure_count: 0,
            input_bytes: 1000,
            output_bytes: 0,
            elapsed: Duration::from_secs(1),
            avg_latency_ms: 0.0,
        };
        assert_eq!(summary.compression_ratio(), None);
    }

    fn test_config(server_uri: &str, mode: ApiMode, chunk_size: usize) -> Config {
        let mut config = Config {
            base_url: format!("{server_uri}/api"),
            mode,
            model: "test-model".to_string(),
            chunk_size,
            ..Default::default()
        };
        config.retry.delay = Duration::from_millis(10);
        config.request.timeout = Duration::from_secs(5);
        config
    }

    #[tokio::test]
    async fn test_end_to_end_generate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "{\"response\":\"squeezed\",\"done\":true}\n",
                "application/x-ndjson",
            ))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        std::fs::write(&input, "hello world").unwrap();
        let output = dir.path().join("nested").join("out.txt");

        let processor = Processor::new(test_config(&server.uri(), ApiMode::Generate, 4000)).unwrap();
        let summary = processor.run(&input, &output, false).await.unwrap();

        assert_eq!(summary.total_chunks, 1);
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.failure_count, 0);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "squeezed");
        assert!(summary.compression_ratio().is_some());
    }

    #[tokio::test]
    async fn test_end_to_end_all_failures_still_writes_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        std::fs::write(&input, "abcdefgh").unwrap();
        let output = dir.path().join("out.txt");

        let processor = Processor::new(test_config(&server.uri(), ApiMode::Generate, 4)).unwrap();
        let summary = processor.run(&input, &output, false).await.unwrap();

        assert_eq!(summary.total_chunks, 2);
        assert_eq!(summary.success_count, 0);
        assert_eq!(summary.failure_count, 2);
        // Fallback keeps the original text, joined by the separator.
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "abcd\n\nefgh");
    }

    #[tokio::test]
    async fn test_end_to_end_empty_input() {
        let server = MockServer::start().await;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.txt");
        std::fs::write(&input, "").unwrap();
        let output = dir.path().join("out.txt");

        let processor = Processor::new(test_config(&server.uri(), ApiMode::Generate, 4000)).unwrap();
        let summary = processor.run(&input, &output, false).await.unwrap();

        assert_eq!(summary.total_chunks, 0);
        assert_eq!(summary.compression_ratio(), None);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
    }

    #[tokio::test]
    async fn test_missing_input_is_a_setup_error() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        let processor = Processor::new(test_config(&server.uri(), ApiMode::Generate, 4000)).unwrap();
        let err = processor
            .run(&dir.path().join("nope.txt"), &dir.path().join("out.txt"), false)
            .await
            .unwrap_err();

        assert!(err.is_setup_error());
    }
}
