//! CLI harness for exercising ENS resolution against an in-memory chain
//!
//! This tool allows testing:
//! - Record write/read round trips
//! - Transaction lifecycle event ordering and failures
//! - Resolution throughput

use anyhow::Context;
use clap::{Parser, Subcommand};
use ens_core::{Address, EnsConfig, RecordKind, TransactionFailure};
use ens_resolution::{
    Ens, EnsNamehash, LifecycleEvent, LifecycleOperation, MemoryChain, NamehashProvider,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const RESOLVER: &str = "0x4976fb03c32e5b8cfe2b6ccb31c09ba78ebaba41";

#[derive(Parser)]
#[command(name = "ens-harness")]
#[command(about = "ENS resolution testing harness", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write every record of a name, then read it back
    Roundtrip {
        /// Name to populate
        #[arg(short, long, default_value = "alice.eth")]
        name: String,
    },

    /// Send one write and print its lifecycle events
    Lifecycle {
        /// Name to write to
        #[arg(short, long, default_value = "alice.eth")]
        name: String,

        /// Confirmations the chain reports per transaction
        #[arg(short = 'n', long, default_value = "3")]
        confirmations: u64,

        /// Reject the transaction after submission
        #[arg(long)]
        reject: bool,
    },

    /// Benchmark read and write throughput
    Benchmark {
        /// Operations per run
        #[arg(short, long, default_value = "1000")]
        operations: u64,

        /// Number of runs
        #[arg(short, long, default_value = "3")]
        runs: u32,
    },

    /// Print the effective configuration as JSON
    ShowConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Roundtrip { name } => {
            run_roundtrip(config, &name).await?;
        }
        Commands::Lifecycle {
            name,
            confirmations,
            reject,
        } => {
            run_lifecycle(config, &name, confirmations, reject).await?;
        }
        Commands::Benchmark { operations, runs } => {
            run_benchmark(config, operations, runs).await?;
        }
        Commands::ShowConfig => {
            println!("{}", config.to_json()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EnsConfig> {
    let Some(path) = path else {
        return Ok(EnsConfig::default());
    };

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = EnsConfig::from_json(&json)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Chain with a full resolver set for `names`, and a client on top of it
fn setup(config: EnsConfig, names: &[&str]) -> anyhow::Result<(Ens, MemoryChain)> {
    let chain = MemoryChain::new();
    let resolver = Address::new(RESOLVER);
    chain.deploy_resolver(resolver.clone());
    for name in names {
        chain.set_resolver(EnsNamehash.hash(name)?, resolver.clone());
    }

    let config = EnsConfig {
        registry_address: chain.registry_address(),
        ..config
    };
    let ens =
        Ens::with_contract_registry(Arc::new(EnsNamehash), Arc::new(chain.clone()), config)?;
    Ok((ens, chain))
}

fn log_events(op: &LifecycleOperation) {
    op.on_transaction_hash(|hash| info!("  transactionHash {}", hash))
        .on_confirmation(|number, receipt| {
            info!("  confirmation #{} (block {:?})", number, receipt.block_number)
        })
        .on_receipt(|receipt| info!("  receipt {:?}", receipt.transaction_hash))
        .on_error(|error| warn!("  error {}", error));
}

async fn run_roundtrip(config: EnsConfig, name: &str) -> anyhow::Result<()> {
    info!("Starting round trip for {}", name);
    let (ens, _) = setup(config, &[name])?;

    for record in RecordKind::ALL {
        let supported = ens.supports_record(name, record).await?;
        info!("  {:<12} supported: {}", record.display_name(), supported);
    }

    let address = Address::new("0x00000000000000000000000000000000000000aa");
    ens.set_address(name, address).await?;
    ens.set_pubkey(name, [1; 32], [2; 32]).await?;
    ens.set_text(name, "url", "https://example.com").await?;
    ens.set_content(name, [3; 32]).await?;
    ens.set_multihash(name, vec![0x12, 0x20, 0x04]).await?;
    ens.set_contenthash(name, vec![0xe3, 0x01, 0x01]).await?;

    let pubkey = ens.get_pubkey(name).await?;
    info!("addr        {}", ens.get_address(name).await?);
    info!("pubkey      x=0x{} y=0x{}", hex::encode(pubkey.x), hex::encode(pubkey.y));
    info!("text[url]   {}", ens.get_text(name, "url").await?);
    info!("content     0x{}", hex::encode(ens.get_content(name).await?));
    info!("multihash   0x{}", hex::encode(ens.get_multihash(name).await?));
    info!("contenthash 0x{}", hex::encode(ens.get_contenthash(name).await?));

    info!("✅ Round trip complete");
    Ok(())
}

async fn run_lifecycle(
    config: EnsConfig,
    name: &str,
    confirmations: u64,
    reject: bool,
) -> anyhow::Result<()> {
    info!("Starting lifecycle test ({} confirmations)", confirmations);
    let (ens, chain) = setup(config, &[name])?;
    chain.set_confirmations(confirmations);
    if reject {
        chain.fail_next_send(TransactionFailure::Rejected);
    }

    let op = ens
        .set_text(name, "url", "https://example.com")
        .with_callback(|outcome| info!("  callback {:?}", outcome.map(|r| r.block_number)))
        .send();
    log_events(&op);

    match op.wait().await {
        Ok(_) => info!("✅ Settled after {} confirmations", op.confirmations()),
        Err(e) => warn!("❌ Failed in state {}: {}", op.state(), e),
    }

    let events = op.subscribe().collect().await;
    let names: Vec<_> = events.iter().map(LifecycleEvent::kind).collect();
    info!("Event order: {:?}", names);
    Ok(())
}

async fn run_benchmark(config: EnsConfig, operations: u64, runs: u32) -> anyhow::Result<()> {
    info!("Starting benchmark: {} operations, {} runs", operations, runs);

    let (ens, chain) = setup(config, &["bench.eth"])?;
    chain.set_confirmations(1);

    let mut total_duration = Duration::ZERO;
    for run in 1..=runs {
        info!("Run {}/{}", run, runs);

        let pb = ProgressBar::new(operations);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
                .progress_chars("=>-"),
        );

        let start_time = Instant::now();
        for i in 0..operations {
            let value = i.to_string();
            ens.set_text("bench.eth", "counter", &value).await?;
            let read = ens.get_text("bench.eth", "counter").await?;
            anyhow::ensure!(read == value, "read {} after writing {}", read, value);
            pb.inc(1);
        }
        pb.finish_with_message("done");

        let elapsed = start_time.elapsed();
        info!(
            "  Duration: {:.2}s | {:.1} round trips/s",
            elapsed.as_secs_f64(),
            operations as f64 / elapsed.as_secs_f64()
        );
        total_duration += elapsed;
    }

    info!("\n📊 Benchmark Results:");
    info!("  Runs: {}", runs);
    info!("  Average duration: {:.2}s", (total_duration / runs.max(1)).as_secs_f64());
    Ok(())
}
