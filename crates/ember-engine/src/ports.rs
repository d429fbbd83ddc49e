//! Port traits for the excluded collaborators.
//!
//! The core treats every external fetch as all-or-nothing: a source
//! either yields a complete data set or the run fails. Retry, pagination
//! and backoff live behind these traits, not in the engine.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use ember_core::types::{Amount, InfoMetadata, NetworkSnapshot, RegistrationBook};
use ember_core::{Address, EmberError};
use ember_vesting::Schedule;

/// Earliest opt-in times, collapsed per address.
#[async_trait]
pub trait RegistrationSource: Send + Sync {
    async fn registrations(&self) -> Result<RegistrationBook, EmberError>;
}

/// Daily network snapshots.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// The snapshot for `date`, or `None` when the day is not yet
    /// available (today's snapshot may be absent or partial).
    async fn fetch(&self, date: NaiveDate) -> Result<Option<NetworkSnapshot>, EmberError>;
}

/// Cumulative previously-minted amounts as of run start.
#[async_trait]
pub trait MintHistorySource: Send + Sync {
    async fn previous_mints(&self) -> Result<BTreeMap<Address, Amount>, EmberError>;

    /// Time of the most recent on-chain distribution, if any.
    async fn last_mint_time(&self) -> Result<Option<i64>, EmberError>;
}

/// Current token balances, used only for holding-ratio multipliers.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn balances(&self) -> Result<BTreeMap<Address, Amount>, EmberError>;
}

/// The static allocation schedule, loaded once per run.
pub trait AllocationSource: Send + Sync {
    fn schedule(&self) -> Result<Schedule, EmberError>;
}

/// The three computed ledgers plus run metadata, ready for broadcast.
///
/// Ledger maps are in display units (whole EMBER, floats), matching what
/// downstream consumers of the published aggregates expect.
#[derive(Debug, Clone, Serialize)]
pub struct PublishPayload {
    pub settled: BTreeMap<String, f64>,
    pub pending: BTreeMap<String, f64>,
    pub estimated: BTreeMap<String, f64>,
    pub info: InfoMetadata,
}

/// Broadcast destination for the computed ledgers.
///
/// The engine publishes once and surfaces failures; it never retries.
#[async_trait]
pub trait PublishSink: Send + Sync {
    async fn publish(&self, payload: &PublishPayload) -> Result<(), EmberError>;
}

/// Result of submitting one mint batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintReceipt {
    pub tx_id: String,
    /// Nonce the batch was submitted with; the next batch uses `nonce + 1`.
    pub nonce: u64,
}

/// On-chain mint executor.
#[async_trait]
pub trait MintSink: Send + Sync {
    /// Submit one batch of `(address, amount)` pairs. `nonce` is `None`
    /// for the first batch of a run; the sink picks the chain nonce and
    /// reports it back.
    async fn mint_batch(
        &self,
        batch: &[(Address, Amount)],
        nonce: Option<u64>,
    ) -> Result<MintReceipt, EmberError>;
}
