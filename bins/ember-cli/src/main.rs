//! ember-cli — batch settlement run for the EMBER distribution program.
//!
//! Loads configuration from `EMBER_*` environment variables, gathers the
//! external inputs from file-backed adapters under the data directory,
//! replays every emission day, and prints the resulting ledgers' totals.
//! `--publish` writes the aggregates; `--mint` submits pending batches
//! through the (dry-run) mint sink.

mod adapters;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use adapters::{
    DryRunMintSink, FilePublishSink, JsonBalanceSource, JsonMintHistorySource,
    JsonRegistrationSource, JsonSnapshotSource, YamlAllocationSource,
};
use ember_core::constants::COIN;
use ember_core::Settings;
use ember_engine::orchestrator::{compute_points, ComputeInputs};
use ember_engine::ports::{
    BalanceSource, MintHistorySource, PublishPayload, PublishSink, RegistrationSource,
};
use ember_engine::{
    mint_pending, plan_batches, AllocationSource, CachingSnapshotProvider, RocksSnapshotStore,
};

/// Compute settled, pending, and estimated EMBER ledgers.
#[derive(Parser)]
#[command(name = "ember-cli")]
#[command(version, about)]
struct Cli {
    /// Increase log verbosity (-v: info, -vv: debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Publish the computed aggregates to the output directory.
    #[arg(short, long)]
    publish: bool,

    /// Plan and submit mint batches for the pending ledger.
    #[arg(short, long)]
    mint: bool,

    /// Override the configured data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = Settings::from_env().context("loading settings")?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    let data_dir = settings.data_dir.clone();

    let registrations = JsonRegistrationSource { path: data_dir.join("registrations.json") }
        .registrations()
        .await
        .context("loading registrations")?;
    let mint_history = JsonMintHistorySource { path: data_dir.join("mints.json") };
    let previous_mints = mint_history
        .previous_mints()
        .await
        .context("loading mint history")?;
    let last_mint_time = mint_history.last_mint_time().await?;
    let balances = JsonBalanceSource { path: data_dir.join("balances.json") }
        .balances()
        .await
        .context("loading balances")?;
    let schedule = YamlAllocationSource { path: data_dir.join("supply.yaml") }
        .schedule()
        .context("loading allocation schedule")?;

    let store = RocksSnapshotStore::open(settings.snapshot_db_path())
        .context("opening snapshot cache")?;
    let source = JsonSnapshotSource { dir: data_dir.join("days") };
    let provider = CachingSnapshotProvider::new(source, store);

    let inputs = ComputeInputs {
        registrations,
        previous_mints,
        balances,
        schedule,
        last_mint_time,
        now: Utc::now().timestamp(),
    };

    let result = compute_points(&settings, &provider, &inputs)
        .await
        .context("computing points")?;

    println!(
        "{} addresses | settled {:.2} EMBER | pending {:.2} EMBER | estimated {:.2} EMBER",
        result.info.total_addresses,
        result.settled.total() as f64 / COIN as f64,
        result.pending.total() as f64 / COIN as f64,
        result.estimated.total() as f64 / COIN as f64,
    );
    for pool in result.pools.iter() {
        tracing::info!(
            pool = %pool.name,
            distributed = pool.distributed,
            total = pool.total,
            "pool distribution"
        );
    }

    if cli.publish {
        let payload = PublishPayload {
            settled: result.settled.to_display_map(),
            pending: result.pending.to_display_map(),
            estimated: result.estimated.to_display_map(),
            info: result.info.clone(),
        };
        FilePublishSink { dir: data_dir.join("out") }
            .publish(&payload)
            .await
            .context("publishing aggregates")?;
    }

    if cli.mint {
        let batches = plan_batches(
            &result.pending,
            settings.mint_min_amount,
            settings.mint_batch_size,
        );
        tracing::info!(batches = batches.len(), "planned mint batches");
        let sink = DryRunMintSink::new();
        let receipts = mint_pending(
            &sink,
            &batches,
            Duration::from_secs(settings.mint_pause_secs),
        )
        .await
        .context("minting pending batches")?;
        for receipt in &receipts {
            println!("batch tx {} (nonce {})", receipt.tx_id, receipt.nonce);
        }
    }

    Ok(())
}
