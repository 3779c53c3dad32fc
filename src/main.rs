//! Squeeze CLI - chunked text compression through a local LLM.
//!
//! Run `squeeze --help` for usage information.

use anyhow::Result;
use console::style;
use squeeze::{Args, Config, Processor};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse_args();

    // Setup logging
    setup_logging(&args);

    // Load configuration
    let config = match Config::from_args(&args) {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    // Validate input file exists
    if !args.input.exists() {
        error!("Input file not found: {:?}", args.input);
        eprintln!(
            "{} Input file not found: {}",
            style("Error:").red().bold(),
            args.input.display()
        );
        std::process::exit(1);
    }

    let show_progress = !args.no_progress;

    print_run_header(&args, &config);

    // Create processor and run
    let processor = Processor::new(config)?;

    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        "Starting compression"
    );

    let summary = match processor.run(&args.input, &args.output, show_progress).await {
        Ok(s) => s,
        Err(e) => {
            error!("Fatal error: {}", e);
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    // Per-chunk failures are reported, not fatal: the run exits 0 as long
    // as the output was written.
    summary.print_summary();
    println!(
        "\n{} Output saved to: {}",
        style("✓").green().bold(),
        args.output.display()
    );
    if summary.failure_count > 0 {
        println!(
            "{} {} chunk(s) kept their original text",
            style("⚠").yellow().bold(),
            summary.failure_count
        );
    }

    Ok(())
}

fn setup_logging(args: &Args) {
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("squeeze={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .compact(),
        )
        .init();
}

fn print_run_header(args: &Args, config: &Config) {
    let input_size = std::fs::metadata(&args.input)
        .map(|m| m.len())
        .unwrap_or(0);

    println!(
        "{} {} ({:.2} MB)",
        style("Compressing:").bold(),
        args.input.display(),
        input_size as f64 / 1024.0 / 1024.0
    );
    println!("  Model:      {}", config.model);
    println!("  Endpoint:   {}", config.api_url());
    println!("  Chunk Size: {} bytes", config.chunk_size);
    println!("  Workers:    {}", config.request.workers);
    println!("  Timeout:    {:?}", config.request.timeout);
    println!(
        "  Retries:    {} (delay {:?})",
        config.retry.max_attempts, config.retry.delay
    );
    println!();
}
