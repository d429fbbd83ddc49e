//! Data model: network snapshots, registrations, reward ledgers.
//!
//! Snapshots arrive as JSON from the indexing service, with scores and
//! token amounts as floats. They are converted to fixed point on ingest
//! (ppb for ratios, embers for amounts) and stay integer from then on.
//! Stored snapshots are bincode-encoded with the same integer fields.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::address::Address;
use crate::constants::RATIO_PRECISION;

/// A token amount in embers (1 EMBER = 10^8 embers).
pub type Amount = u64;

/// Lifecycle state of a staking node.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Active,
    Inactive,
    Waiting,
    #[serde(other)]
    Unknown,
}

/// Lifecycle state of a resource node.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
#[serde(rename_all = "lowercase")]
pub enum ResourceNodeStatus {
    Linked,
    Unlinked,
    Waiting,
    #[serde(other)]
    Unknown,
}

/// One staking node as observed in a daily snapshot.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, bincode::Encode, bincode::Decode)]
pub struct Node {
    pub hash: String,
    pub owner: Address,
    /// Raw designated reward address; resolved leniently via [`Node::payout_address`].
    #[serde(default)]
    pub reward: Option<String>,
    pub status: NodeStatus,
    #[serde(rename = "score", with = "bridge::ratio")]
    pub score_ppb: u64,
    /// Staked amount per staker, in embers. Does not include the node's
    /// implicit self-stake.
    #[serde(default, with = "bridge::amount_map")]
    pub stakers: BTreeMap<Address, Amount>,
    /// Linked resource node hashes, in declaration order. Order is payment
    /// order: only the first `max_paid_resource_nodes` scoring entries earn.
    #[serde(default)]
    pub resource_nodes: Vec<String>,
}

impl Node {
    /// The address this node's rewards are paid to.
    ///
    /// A missing or malformed reward address falls back to the owner.
    pub fn payout_address(&self) -> Address {
        self.reward
            .as_deref()
            .and_then(|raw| Address::parse(raw).ok())
            .unwrap_or_else(|| self.owner.clone())
    }
}

/// One resource node as observed in a daily snapshot.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, bincode::Encode, bincode::Decode)]
pub struct ResourceNode {
    pub hash: String,
    pub owner: Address,
    #[serde(default)]
    pub reward: Option<String>,
    pub status: ResourceNodeStatus,
    #[serde(rename = "score", with = "bridge::ratio")]
    pub score_ppb: u64,
    #[serde(rename = "decentralization", default, with = "bridge::ratio")]
    pub decentralization_ppb: u64,
}

impl ResourceNode {
    /// The address this resource node's rewards are paid to, falling back
    /// to the owner on a missing or malformed reward address.
    pub fn payout_address(&self) -> Address {
        self.reward
            .as_deref()
            .and_then(|raw| Address::parse(raw).ok())
            .unwrap_or_else(|| self.owner.clone())
    }
}

/// The full network state recorded for one calendar day.
///
/// Immutable once recorded: a stored day is only ever fetched, never
/// recomputed.
#[derive(
    Serialize, Deserialize, Clone, Debug, Default, PartialEq,
    bincode::Encode, bincode::Decode,
)]
pub struct NetworkSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub resource_nodes: Vec<ResourceNode>,
}

impl NetworkSnapshot {
    /// Nodes with `status == active`, in snapshot order.
    pub fn active_nodes(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| n.status == NodeStatus::Active)
            .collect()
    }

    /// Look up a resource node by hash.
    pub fn resource_node(&self, hash: &str) -> Option<&ResourceNode> {
        self.resource_nodes.iter().find(|rn| rn.hash == hash)
    }
}

/// Earliest opt-in time per address.
///
/// Built by collapsing every opt-in event for an address down to the
/// minimum timestamp; immutable once computed for a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrationBook(BTreeMap<Address, i64>);

impl RegistrationBook {
    /// Collapse `(address, time)` events, keeping the earliest time per address.
    pub fn from_events<I: IntoIterator<Item = (Address, i64)>>(events: I) -> Self {
        let mut map: BTreeMap<Address, i64> = BTreeMap::new();
        for (address, ts) in events {
            map.entry(address)
                .and_modify(|first| *first = (*first).min(ts))
                .or_insert(ts);
        }
        Self(map)
    }

    pub fn first_seen(&self, address: &Address) -> Option<i64> {
        self.0.get(address).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, i64)> {
        self.0.iter().map(|(a, &t)| (a, t))
    }

    /// Addresses registered strictly before both `before` and `cutoff`.
    pub fn registered_before(&self, before: i64, cutoff: i64) -> impl Iterator<Item = &Address> {
        self.0
            .iter()
            .filter(move |&(_, &t)| t < before && t < cutoff)
            .map(|(a, _)| a)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Accumulated reward amounts per address.
///
/// Construction is strictly additive: accumulation never decrements an
/// entry. Scaling (cluster multipliers) replaces entries wholesale and is
/// only applied by the orchestrator at well-defined points.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RewardLedger(BTreeMap<Address, Amount>);

impl RewardLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to an address, saturating at `u64::MAX`.
    pub fn credit(&mut self, address: &Address, amount: Amount) {
        if amount == 0 {
            return;
        }
        let entry = self.0.entry(address.clone()).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    pub fn get(&self, address: &Address) -> Amount {
        self.0.get(address).copied().unwrap_or(0)
    }

    /// Replace an entry with a scaled value. Used for cluster multipliers.
    pub fn rescale(&mut self, scale: impl Fn(&Address, Amount) -> Amount) {
        for (address, amount) in self.0.iter_mut() {
            *amount = scale(address, *amount);
        }
    }

    /// Fold every entry of `other` into this ledger.
    pub fn merge(&mut self, other: &RewardLedger) {
        for (address, &amount) in other.0.iter() {
            self.credit(address, amount);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, Amount)> {
        self.0.iter().map(|(a, &v)| (a, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all entries, saturating.
    pub fn total(&self) -> Amount {
        self.0.values().fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    /// Display-unit view (whole EMBER as floats) for publishing.
    pub fn to_display_map(&self) -> BTreeMap<String, f64> {
        self.0
            .iter()
            .map(|(a, &v)| (a.to_string(), v as f64 / crate::constants::COIN as f64))
            .collect()
    }
}

impl FromIterator<(Address, Amount)> for RewardLedger {
    fn from_iter<I: IntoIterator<Item = (Address, Amount)>>(iter: I) -> Self {
        let mut ledger = Self::default();
        for (address, amount) in iter {
            ledger.credit(&address, amount);
        }
        ledger
    }
}

/// Run metadata published alongside the ledgers.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct InfoMetadata {
    /// Timestamp the computation ran at.
    pub run_time: i64,
    /// Last on-chain mint time seen by the run, if any.
    pub last_mint_time: Option<i64>,
    /// Number of addresses with a nonzero computed total.
    pub total_addresses: usize,
    /// Number of addresses eligible for the early-registration bonus.
    pub bonus_addresses: usize,
}

/// Serde bridges between external floating-point JSON and fixed point.
mod bridge {
    use super::*;
    use serde::{Deserializer, Serializer};

    fn to_ppb(value: f64) -> u64 {
        (value.clamp(0.0, f64::MAX) * RATIO_PRECISION as f64).round() as u64
    }

    fn to_embers(value: f64) -> Amount {
        (value.clamp(0.0, f64::MAX) * crate::constants::COIN as f64).round() as u64
    }

    /// `f64` ratio in the external document <-> ppb in memory.
    pub mod ratio {
        use super::*;

        pub fn serialize<S: Serializer>(ppb: &u64, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_f64(*ppb as f64 / RATIO_PRECISION as f64)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
            Ok(to_ppb(f64::deserialize(deserializer)?))
        }
    }

    /// `f64` token amounts keyed by address <-> embers in memory.
    pub mod amount_map {
        use super::*;

        pub fn serialize<S: Serializer>(
            map: &BTreeMap<Address, Amount>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            use serde::ser::SerializeMap;
            let mut out = serializer.serialize_map(Some(map.len()))?;
            for (address, amount) in map {
                out.serialize_entry(address, &(*amount as f64 / crate::constants::COIN as f64))?;
            }
            out.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<BTreeMap<Address, Amount>, D::Error> {
            let raw = BTreeMap::<Address, f64>::deserialize(deserializer)?;
            Ok(raw.into_iter().map(|(a, v)| (a, to_embers(v))).collect())
        }
    }
}
