//! holder-eth CLI: total ETH held by BAYC holders at a Unix timestamp.

use clap::error::ErrorKind;
use clap::Parser;
use holder_eth::chain::parse_epoch;
use holder_eth::{
    AlchemyOwners, BatchConfig, EtherscanResolver, HttpClient, HttpConfig, Pipeline,
    PipelineConfig, RetryPolicy, RpcNode, Settings,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; variables may come from the shell.
    let _ = dotenv::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout; usage errors to stderr.
            let _ = e.print();
            std::process::exit(exit_code(&e));
        }
    };
    run(cli)
}

/// Exit status for an argument-parsing outcome: 0 for help/version, 1 otherwise.
fn exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

#[derive(Parser)]
#[command(name = "holder-eth")]
#[command(author = "gorusys <goru.connector@outlook.com>")]
#[command(version)]
#[command(about = "Total ETH held by BAYC holders at the last block before a Unix timestamp")]
struct Cli {
    /// Unix timestamp in seconds.
    #[arg(value_parser = parse_epoch_arg)]
    epoch: u64,
    /// Balance requests in flight per batch.
    #[arg(long, default_value_t = 30)]
    batch_size: usize,
    /// Attempts per address before counting its balance as 0.
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: u32,
    /// Pause between batches, in milliseconds.
    #[arg(long, default_value_t = 500)]
    batch_pause_ms: u64,
    /// Abort owner enumeration after this many pages.
    #[arg(long, default_value_t = 10_000)]
    max_pages: usize,
    /// Minimum spacing between explorer/index requests, in milliseconds. 0 disables.
    #[arg(long, default_value_t = 0)]
    request_interval_ms: u64,
    /// Per-request timeout for explorer/index requests, in seconds.
    #[arg(long, default_value_t = 30)]
    http_timeout_secs: u64,
}

fn parse_epoch_arg(s: &str) -> Result<u64, String> {
    parse_epoch(s).map_err(|e| e.to_string())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env();
    let missing = settings.missing();
    if !missing.is_empty() {
        warn!(?missing, "environment variables not set; requests will likely fail");
    }

    let http = Arc::new(HttpClient::new(HttpConfig {
        timeout_secs: cli.http_timeout_secs,
        min_interval_ms: cli.request_interval_ms,
    })?);
    let resolver = EtherscanResolver::new(
        Arc::clone(&http),
        settings.etherscan_url.clone(),
        settings.etherscan_api_key.clone(),
    );
    let owners = AlchemyOwners::new(
        Arc::clone(&http),
        settings.alchemy_url.clone(),
        settings.alchemy_api_key.clone(),
    );
    let balances = RpcNode::new(&settings.rpc_url)?;

    let config = PipelineConfig {
        batch: BatchConfig {
            batch_size: cli.batch_size,
            pause: Duration::from_millis(cli.batch_pause_ms),
        },
        retry: RetryPolicy {
            max_attempts: cli.max_attempts,
            ..Default::default()
        },
        max_pages: cli.max_pages,
    };
    let pipeline = Pipeline::new(resolver, owners, balances, config);

    let rt = tokio::runtime::Runtime::new()?;
    let summary = rt.block_on(pipeline.run(cli.epoch))?;
    info!(requests = http.request_count(), "run complete");

    if summary.total.degraded > 0 {
        eprintln!(
            "Warning: {} of {} holders could not be fetched and were counted as 0 ETH",
            summary.total.degraded, summary.total.holders
        );
    }
    println!(
        "Total ETH held by BAYC holders at epoch {} (block {}): {:.4} ETH",
        summary.epoch, summary.block, summary.total.eth
    );
    Ok(())
}
