//! File-backed implementations of the engine ports.
//!
//! These adapters stand in for the network services: JSON fixtures under
//! the data directory for registrations, snapshots, mint history and
//! balances; a YAML file for the allocation schedule; JSON output for the
//! publish sink; a dry-run logger for the mint sink. They decode and
//! encode, nothing more.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use ember_core::constants::COIN;
use ember_core::types::{Amount, NetworkSnapshot, RegistrationBook};
use ember_core::{Address, EmberError};
use ember_engine::ports::{
    BalanceSource, MintHistorySource, MintReceipt, MintSink, PublishPayload, PublishSink,
    RegistrationSource, SnapshotSource,
};
use ember_engine::AllocationSource;
use ember_vesting::Schedule;

/// Aggregate key for the settled ledger.
pub const SETTLED_KEY: &str = "tokens";
/// Aggregate key for the pending ledger.
pub const PENDING_KEY: &str = "pending_tokens";
/// Aggregate key for the three-year projection.
pub const ESTIMATED_KEY: &str = "estimated_3yr_tokens";

fn to_embers(tokens: f64) -> Amount {
    (tokens.clamp(0.0, f64::MAX) * COIN as f64).round() as u64
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T, EmberError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| EmberError::Source(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&data).map_err(|e| EmberError::Source(format!("{}: {e}", path.display())))
}

/// `registrations.json`: `{ "0x...": 1704067200, ... }`.
pub struct JsonRegistrationSource {
    pub path: PathBuf,
}

#[async_trait]
impl RegistrationSource for JsonRegistrationSource {
    async fn registrations(&self) -> Result<RegistrationBook, EmberError> {
        let raw: BTreeMap<Address, i64> = read_json(&self.path)?;
        Ok(RegistrationBook::from_events(raw))
    }
}

/// `days/YYYY-MM-DD.json`, one snapshot per file.
pub struct JsonSnapshotSource {
    pub dir: PathBuf,
}

#[async_trait]
impl SnapshotSource for JsonSnapshotSource {
    async fn fetch(&self, date: NaiveDate) -> Result<Option<NetworkSnapshot>, EmberError> {
        let path = self.dir.join(format!("{}.json", date.format("%Y-%m-%d")));
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(read_json(&path)?))
    }
}

#[derive(Deserialize)]
struct MintHistoryFile {
    #[serde(default)]
    last_mint_time: Option<i64>,
    /// Cumulative previously-minted whole tokens per address.
    #[serde(default)]
    minted: BTreeMap<Address, f64>,
}

/// `mints.json`: `{ "last_mint_time": ..., "minted": { "0x...": 12.5 } }`.
pub struct JsonMintHistorySource {
    pub path: PathBuf,
}

impl JsonMintHistorySource {
    fn load(&self) -> Result<MintHistoryFile, EmberError> {
        if !self.path.exists() {
            return Ok(MintHistoryFile { last_mint_time: None, minted: BTreeMap::new() });
        }
        read_json(&self.path)
    }
}

#[async_trait]
impl MintHistorySource for JsonMintHistorySource {
    async fn previous_mints(&self) -> Result<BTreeMap<Address, Amount>, EmberError> {
        Ok(self
            .load()?
            .minted
            .into_iter()
            .map(|(address, tokens)| (address, to_embers(tokens)))
            .collect())
    }

    async fn last_mint_time(&self) -> Result<Option<i64>, EmberError> {
        Ok(self.load()?.last_mint_time)
    }
}

/// `balances.json`: `{ "0x...": 100.5, ... }` in whole tokens.
pub struct JsonBalanceSource {
    pub path: PathBuf,
}

#[async_trait]
impl BalanceSource for JsonBalanceSource {
    async fn balances(&self) -> Result<BTreeMap<Address, Amount>, EmberError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw: BTreeMap<Address, f64> = read_json(&self.path)?;
        Ok(raw.into_iter().map(|(a, t)| (a, to_embers(t))).collect())
    }
}

/// `supply.yaml`, the allocation schedule.
pub struct YamlAllocationSource {
    pub path: PathBuf,
}

impl AllocationSource for YamlAllocationSource {
    fn schedule(&self) -> Result<Schedule, EmberError> {
        Ok(Schedule::from_path(&self.path)?)
    }
}

/// Writes the aggregates as JSON files under an output directory.
pub struct FilePublishSink {
    pub dir: PathBuf,
}

impl FilePublishSink {
    fn write_json<T: serde::Serialize>(&self, name: &str, value: &T) -> Result<(), EmberError> {
        let path = self.dir.join(format!("{name}.json"));
        let data = serde_json::to_string_pretty(value)
            .map_err(|e| EmberError::Publish(e.to_string()))?;
        std::fs::write(&path, data)
            .map_err(|e| EmberError::Publish(format!("{}: {e}", path.display())))
    }
}

#[async_trait]
impl PublishSink for FilePublishSink {
    async fn publish(&self, payload: &PublishPayload) -> Result<(), EmberError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| EmberError::Publish(format!("{}: {e}", self.dir.display())))?;
        self.write_json(SETTLED_KEY, &payload.settled)?;
        self.write_json(PENDING_KEY, &payload.pending)?;
        self.write_json(ESTIMATED_KEY, &payload.estimated)?;
        self.write_json("info", &payload.info)?;
        tracing::info!(dir = %self.dir.display(), "published aggregates");
        Ok(())
    }
}

/// Logs batches instead of broadcasting them; nonces count up from zero.
pub struct DryRunMintSink {
    next_nonce: AtomicU64,
}

impl DryRunMintSink {
    pub fn new() -> Self {
        Self { next_nonce: AtomicU64::new(0) }
    }
}

impl Default for DryRunMintSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MintSink for DryRunMintSink {
    async fn mint_batch(
        &self,
        batch: &[(Address, Amount)],
        nonce: Option<u64>,
    ) -> Result<MintReceipt, EmberError> {
        let nonce = nonce.unwrap_or_else(|| self.next_nonce.load(Ordering::SeqCst));
        self.next_nonce.store(nonce + 1, Ordering::SeqCst);
        let total: u64 = batch.iter().map(|(_, v)| v).sum();
        tracing::info!(
            items = batch.len(),
            total_embers = total,
            nonce,
            "dry-run mint batch (not broadcast)"
        );
        Ok(MintReceipt { tx_id: format!("dry-run-{nonce}"), nonce })
    }
}
