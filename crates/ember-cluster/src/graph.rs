//! Link recording and finalized cluster queries.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ember_core::constants::RATIO_PRECISION;
use ember_core::types::Amount;
use ember_core::Address;
use ember_emission::{holding_multiplier_ppb, mul_div};

use crate::union_find::UnionFind;

/// Accumulates `(owner, reward)` address links per node hash.
///
/// Recording is idempotent: replaying the same day twice, or observing the
/// same pair on every processed day, changes nothing.
#[derive(Debug, Clone, Default)]
pub struct ClusterGraph {
    links: BTreeMap<String, BTreeSet<Address>>,
}

impl ClusterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `owner` and `reward` appeared together on `node_hash`.
    pub fn record_link(&mut self, node_hash: &str, owner: &Address, reward: &Address) {
        let set = self.links.entry(node_hash.to_string()).or_default();
        set.insert(owner.clone());
        if reward != owner {
            set.insert(reward.clone());
        }
    }

    /// Number of node hashes with at least one recorded link.
    pub fn linked_nodes(&self) -> usize {
        self.links.len()
    }

    /// Compute the transitive closure and produce the queryable set.
    ///
    /// Every address in a node hash's link set is unioned; addresses shared
    /// across hashes merge those hashes' groups, to any chain depth.
    pub fn finalize(self) -> ClusterSet {
        let mut index: HashMap<Address, usize> = HashMap::new();
        let mut addresses: Vec<Address> = Vec::new();
        for set in self.links.values() {
            for address in set {
                if !index.contains_key(address) {
                    index.insert(address.clone(), addresses.len());
                    addresses.push(address.clone());
                }
            }
        }

        let mut forest = UnionFind::new(addresses.len());
        for set in self.links.values() {
            let mut ids = set.iter().map(|a| index[a]);
            if let Some(first) = ids.next() {
                for id in ids {
                    forest.union(first, id);
                }
            }
        }

        let mut members_by_root: HashMap<usize, Vec<Address>> = HashMap::new();
        for (id, address) in addresses.iter().enumerate() {
            members_by_root
                .entry(forest.find(id))
                .or_default()
                .push(address.clone());
        }

        let mut members: Vec<Vec<Address>> = Vec::with_capacity(members_by_root.len());
        let mut cluster_of: HashMap<Address, usize> = HashMap::with_capacity(addresses.len());
        for (_, group) in members_by_root {
            let cluster_id = members.len();
            for address in &group {
                cluster_of.insert(address.clone(), cluster_id);
            }
            members.push(group);
        }

        tracing::debug!(
            addresses = addresses.len(),
            clusters = members.len(),
            "finalized address clustering"
        );

        ClusterSet { cluster_of, members }
    }
}

/// Finalized, transitively-closed address clusters.
///
/// Obtainable only through [`ClusterGraph::finalize`], so every query sees
/// the complete closure.
#[derive(Debug, Clone)]
pub struct ClusterSet {
    cluster_of: HashMap<Address, usize>,
    members: Vec<Vec<Address>>,
}

impl ClusterSet {
    /// All members of `address`'s cluster, `address` included.
    ///
    /// An address never observed in any link forms a singleton cluster.
    pub fn members_of<'a>(&'a self, address: &'a Address) -> impl Iterator<Item = &'a Address> {
        let linked = self
            .cluster_of
            .get(address)
            .map(|&id| self.members[id].as_slice())
            .unwrap_or(&[]);
        let fallback = std::slice::from_ref(address);
        if linked.is_empty() { fallback.iter() } else { linked.iter() }
    }

    /// Number of distinct clusters.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Holding multiplier for an address, evaluated over its whole cluster.
    ///
    /// Balances and previously-minted amounts are summed across the
    /// cluster. Clusters minted less than `min_minted` keep a 1x
    /// multiplier: the holding requirement is not meant to amplify
    /// rounding noise on negligible accounts.
    pub fn multiplier_ppb(
        &self,
        address: &Address,
        previous_mints: &BTreeMap<Address, Amount>,
        balances: &BTreeMap<Address, Amount>,
        min_minted: Amount,
    ) -> u64 {
        let mut minted: u128 = 0;
        let mut held: u128 = 0;
        for member in self.members_of(address) {
            minted += previous_mints.get(member).copied().unwrap_or(0) as u128;
            held += balances.get(member).copied().unwrap_or(0) as u128;
        }

        if minted < min_minted as u128 {
            return RATIO_PRECISION;
        }

        let ratio_ppb = mul_div(
            held.min(u64::MAX as u128) as u64,
            RATIO_PRECISION,
            minted.min(u64::MAX as u128) as u64,
        );
        holding_multiplier_ppb(ratio_ppb)
    }
}
