//! Sumi-Ebb main entry point
//!
//! This is the command-line interface for the Sumi-Ebb fetch scheduler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_ebb::config::{load_config, validate, Config};
use sumi_ebb::scheduler::{run_to_completion, Event};
use tracing_subscriber::EnvFilter;

/// Sumi-Ebb: a self-throttling fetch scheduler
///
/// Sumi-Ebb reads every configured URL with bounded parallelism, pausing
/// whenever the remote signals rate limiting and retrying afterwards.
#[derive(Parser, Debug)]
#[command(name = "sumi-ebb")]
#[command(version)]
#[command(about = "A self-throttling fetch scheduler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Additional URL to read (may be repeated)
    #[arg(long = "url", value_name = "URL")]
    urls: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be read without reading
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    config.input.urls.extend(cli.urls);
    validate(&config).context("Invalid --url argument")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_run(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_ebb=info,warn"),
            1 => EnvFilter::new("sumi_ebb=debug,info"),
            2 => EnvFilter::new("sumi_ebb=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Ebb Dry Run ===\n");

    println!("Scheduler:");
    println!(
        "  Default pause: {}s",
        config.scheduler.default_pause_seconds
    );
    match config.scheduler.concurrency_limit {
        0 => println!("  Concurrency limit: unbounded"),
        n => println!("  Concurrency limit: {}", n),
    }
    println!("  Idle delay: {}ms", config.scheduler.idle_delay_ms);

    println!("\nUser Agent:");
    println!(
        "  {}/{} (timeout {}s)",
        config.user_agent.name, config.user_agent.version, config.user_agent.request_timeout_seconds
    );

    println!("\nURLs ({}):", config.input.urls.len());
    for url in &config.input.urls {
        println!("  - {}", url);
    }

    println!("\n✓ Configuration is valid");
}

/// Reads every URL and prints progress the way a human watches it
async fn handle_run(config: Config) -> anyhow::Result<()> {
    let total = config.input.urls.len();
    let mut current = 0;

    let summary = run_to_completion(config, |event| match event {
        Event::Data { url, body } => {
            current += 1;
            println!(
                "{} {} of {} {} {}",
                time_label(),
                current,
                total,
                url,
                String::from_utf8_lossy(body)
            );
        }
        Event::Pause { retry_after_secs } => {
            println!("{} ... ({}s)", time_label(), retry_after_secs);
        }
        Event::Error { error, .. } => {
            tracing::debug!("{}", error);
        }
        Event::SysError { error, .. } => {
            println!("{} {}", time_label(), error);
        }
    })
    .await?;

    println!(
        "\n✓ {} of {} read ({} errors, {} pauses, {} lost) in {:.1}s",
        summary.data,
        summary.total,
        summary.errors,
        summary.pauses,
        summary.sys_errors,
        summary.elapsed.as_secs_f64()
    );

    Ok(())
}

fn time_label() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
