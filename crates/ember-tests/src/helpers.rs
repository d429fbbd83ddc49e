//! Builders and stub sources for pipeline tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;

use ember_core::constants::{COIN, RATIO_PRECISION, SECS_PER_DAY};
use ember_core::types::{
    Amount, NetworkSnapshot, Node, NodeStatus, ResourceNode, ResourceNodeStatus,
};
use ember_core::{Address, EmberError, Settings};
use ember_engine::ports::SnapshotSource;
use ember_engine::store::{CachingSnapshotProvider, MemorySnapshotStore};
use ember_vesting::Schedule;

/// Deterministic test address from a small seed.
pub fn addr(seed: u8) -> Address {
    Address::parse(&format!("0x{:040x}", seed as u64)).unwrap()
}

/// Settings pinned for tests: defaults with a short projection horizon.
pub fn test_settings() -> Settings {
    Settings {
        estimate_horizon_days: 10,
        ..Settings::default()
    }
}

/// Unix time `days` (fractional allowed via `extra_secs`) after program start.
pub fn at_day(settings: &Settings, days: i64, extra_secs: i64) -> i64 {
    settings.program_start + days * SECS_PER_DAY + extra_secs
}

/// An active node with one staker and optional resource node links.
pub fn staked_node(
    hash: &str,
    owner: u8,
    score: f64,
    staker: u8,
    stake_tokens: u64,
    resource_nodes: &[&str],
) -> Node {
    Node {
        hash: hash.into(),
        owner: addr(owner),
        reward: None,
        status: NodeStatus::Active,
        score_ppb: (score * RATIO_PRECISION as f64) as u64,
        stakers: BTreeMap::from([(addr(staker), stake_tokens * COIN)]),
        resource_nodes: resource_nodes.iter().map(|s| s.to_string()).collect(),
    }
}

/// A linked resource node.
pub fn linked_resource_node(hash: &str, owner: u8, score: f64) -> ResourceNode {
    ResourceNode {
        hash: hash.into(),
        owner: addr(owner),
        reward: None,
        status: ResourceNodeStatus::Linked,
        score_ppb: (score * RATIO_PRECISION as f64) as u64,
        decentralization_ppb: 0,
    }
}

/// The reference network: one active node scored 0.9 with staker X
/// staking 100, linked to resource nodes scored 0.5 and 0.0.
pub fn reference_snapshot() -> NetworkSnapshot {
    NetworkSnapshot {
        nodes: vec![staked_node("n1", 1, 0.9, 10, 100, &["r1", "r2"])],
        resource_nodes: vec![
            linked_resource_node("r1", 2, 0.5),
            linked_resource_node("r2", 3, 0.0),
        ],
    }
}

/// Snapshot source backed by a fixed per-day map.
pub struct MapSource {
    pub days: BTreeMap<NaiveDate, NetworkSnapshot>,
}

impl MapSource {
    /// The same snapshot for every day in `[start, start + count)`.
    pub fn uniform(start: NaiveDate, count: u64, snapshot: &NetworkSnapshot) -> Self {
        let mut days = BTreeMap::new();
        let mut date = start;
        for _ in 0..count {
            days.insert(date, snapshot.clone());
            date = date.succ_opt().unwrap();
        }
        Self { days }
    }
}

#[async_trait]
impl SnapshotSource for MapSource {
    async fn fetch(&self, date: NaiveDate) -> Result<Option<NetworkSnapshot>, EmberError> {
        Ok(self.days.get(&date).cloned())
    }
}

/// A map-backed provider with an in-memory store.
pub fn provider(source: MapSource) -> CachingSnapshotProvider<MapSource, MemorySnapshotStore> {
    CachingSnapshotProvider::new(source, MemorySnapshotStore::new())
}

/// An empty allocation schedule.
pub fn empty_schedule() -> Schedule {
    Schedule::from_yaml_str("max_supply: 60000000\npools: {}\nallocations: []\n").unwrap()
}

/// A schedule with one instant and one linear grant to `to` out of a
/// single pool.
pub fn grant_schedule(to: &Address, instant_tokens: u64, linear_tokens: u64, duration_days: u64) -> Schedule {
    let yaml = format!(
        r#"
max_supply: 60000000
pools:
  team:
    total: 10000000
allocations:
  - address: "{to}"
    amount: {instant_tokens}
    pool: team
    type: instant
  - address: "{to}"
    amount: {linear_tokens}
    pool: team
    type: linear
    duration: {duration_days}
"#
    );
    Schedule::from_yaml_str(&yaml).unwrap()
}

/// A schedule with a single linear grant to `to`.
pub fn linear_schedule(to: &Address, tokens: u64, duration_days: u64) -> Schedule {
    let yaml = format!(
        r#"
max_supply: 60000000
pools:
  team:
    total: 10000000
allocations:
  - address: "{to}"
    amount: {tokens}
    pool: team
    type: linear
    duration: {duration_days}
"#
    );
    Schedule::from_yaml_str(&yaml).unwrap()
}

/// Balances map in whole tokens.
pub fn balances(entries: &[(u8, u64)]) -> BTreeMap<Address, Amount> {
    entries.iter().map(|&(n, t)| (addr(n), t * COIN)).collect()
}

/// Previous mints map in whole tokens.
pub fn mints(entries: &[(u8, u64)]) -> BTreeMap<Address, Amount> {
    balances(entries)
}
