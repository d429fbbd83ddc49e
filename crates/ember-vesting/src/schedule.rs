//! Allocation schedule model and YAML parsing.
//!
//! The schedule file carries amounts in whole tokens:
//!
//! ```yaml
//! max_supply: 60000000
//! pools:
//!   team:
//!     total: 9000000
//!   reserves:
//!     total: 15000000
//! allocations:
//!   - address: "0x8430493c7CC24Df1c130f9d729Ce4FCf40F05215"
//!     amount: 1000000
//!     pool: team
//!     type: instant
//!   - address: "0x8430493c7CC24Df1c130f9d729Ce4FCf40F05215"
//!     amount: 8000000
//!     pool: team
//!     type: linear
//!     duration: 2400
//!     cliff: 180
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use ember_core::constants::COIN;
use ember_core::error::ScheduleError;
use ember_core::types::Amount;
use ember_core::Address;

/// A named bucket of pre-committed tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub name: String,
    pub total: Amount,
    /// Cumulative amount resolved against this pool, incremented as
    /// allocations are realized. Never decremented.
    pub distributed: Amount,
}

/// All pools of a schedule, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolRegistry(BTreeMap<String, Pool>);

impl PoolRegistry {
    pub fn get(&self, name: &str) -> Option<&Pool> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pool> {
        self.0.values()
    }

    /// Add a realized amount to a pool's distributed counter.
    ///
    /// An unknown pool name is skipped. Overshooting the pool total is
    /// reported and left in place: the counters are informational and the
    /// schedule is the authority on what is owed.
    pub fn record_distribution(&mut self, name: &str, amount: Amount) {
        let Some(pool) = self.0.get_mut(name) else {
            tracing::warn!(pool = name, "allocation names unknown pool");
            return;
        };
        pool.distributed = pool.distributed.saturating_add(amount);
        if pool.distributed > pool.total {
            tracing::warn!(
                pool = name,
                distributed = pool.distributed,
                total = pool.total,
                "pool distribution exceeds its total"
            );
        }
    }
}

impl FromIterator<Pool> for PoolRegistry {
    fn from_iter<I: IntoIterator<Item = Pool>>(iter: I) -> Self {
        Self(iter.into_iter().map(|p| (p.name.clone(), p)).collect())
    }
}

/// How an allocation releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationKind {
    /// Full amount due unconditionally once queried.
    Instant,
    /// Released minute-by-minute over `duration_days`, starting after
    /// `cliff_days` from the vesting start.
    Linear { duration_days: u64, cliff_days: u64 },
}

/// One grant from a pool to an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub address: Address,
    pub pool: String,
    pub amount: Amount,
    pub kind: AllocationKind,
}

/// A parsed allocation schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub max_supply: Amount,
    pub pools: PoolRegistry,
    pub allocations: Vec<Allocation>,
}

impl Schedule {
    pub fn from_yaml_str(input: &str) -> Result<Self, ScheduleError> {
        let raw: RawSchedule =
            serde_yaml::from_str(input).map_err(|e| ScheduleError::Parse(e.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn from_path(path: &Path) -> Result<Self, ScheduleError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| ScheduleError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_yaml_str(&input)
    }

    fn from_raw(raw: RawSchedule) -> Result<Self, ScheduleError> {
        let pools = raw
            .pools
            .into_iter()
            .map(|(name, pool)| Pool {
                name,
                total: to_embers(pool.total),
                distributed: 0,
            })
            .collect();

        let mut allocations = Vec::with_capacity(raw.allocations.len());
        for alloc in raw.allocations {
            let address = Address::parse(&alloc.address)?;
            let amount = to_embers(alloc.amount);
            if amount == 0 {
                return Err(ScheduleError::ZeroAmount(alloc.address));
            }
            let kind = match alloc.kind.as_str() {
                "instant" => AllocationKind::Instant,
                "linear" => AllocationKind::Linear {
                    duration_days: alloc
                        .duration
                        .ok_or_else(|| ScheduleError::MissingDuration(alloc.address.clone()))?,
                    cliff_days: alloc.cliff.unwrap_or(0),
                },
                other => return Err(ScheduleError::UnknownKind(other.to_string())),
            };
            allocations.push(Allocation { address, pool: alloc.pool, amount, kind });
        }

        Ok(Self {
            max_supply: to_embers(raw.max_supply),
            pools,
            allocations,
        })
    }
}

fn to_embers(tokens: f64) -> Amount {
    (tokens.clamp(0.0, f64::MAX) * COIN as f64).round() as u64
}

#[derive(Deserialize)]
struct RawSchedule {
    max_supply: f64,
    #[serde(default)]
    pools: BTreeMap<String, RawPool>,
    #[serde(default)]
    allocations: Vec<RawAllocation>,
}

#[derive(Deserialize)]
struct RawPool {
    total: f64,
}

#[derive(Deserialize)]
struct RawAllocation {
    address: String,
    amount: f64,
    pool: String,
    #[serde(rename = "type")]
    kind: String,
    duration: Option<u64>,
    cliff: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
max_supply: 60000000
pools:
  team:
    total: 9000000
  reserves:
    total: 15000000
allocations:
  - address: "0x8430493c7CC24Df1c130f9d729Ce4FCf40F05215"
    amount: 1000000
    pool: team
    type: instant
  - address: "0x8430493c7CC24Df1c130f9d729Ce4FCf40F05215"
    amount: 8000000
    pool: team
    type: linear
    duration: 2400
    cliff: 180
"#;

    #[test]
    fn parses_sample_schedule() {
        let schedule = Schedule::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(schedule.max_supply, 60_000_000 * COIN);
        assert_eq!(schedule.pools.get("team").unwrap().total, 9_000_000 * COIN);
        assert_eq!(schedule.allocations.len(), 2);
        assert_eq!(schedule.allocations[0].kind, AllocationKind::Instant);
        assert_eq!(
            schedule.allocations[1].kind,
            AllocationKind::Linear { duration_days: 2400, cliff_days: 180 }
        );
    }

    #[test]
    fn pool_distributed_starts_at_zero() {
        let schedule = Schedule::from_yaml_str(SAMPLE).unwrap();
        assert!(schedule.pools.iter().all(|p| p.distributed == 0));
    }

    #[test]
    fn linear_without_duration_rejected() {
        let bad = r#"
max_supply: 100
pools: {}
allocations:
  - address: "0x8430493c7CC24Df1c130f9d729Ce4FCf40F05215"
    amount: 10
    pool: team
    type: linear
"#;
        assert!(matches!(
            Schedule::from_yaml_str(bad),
            Err(ScheduleError::MissingDuration(_))
        ));
    }

    #[test]
    fn unknown_kind_rejected() {
        let bad = r#"
max_supply: 100
pools: {}
allocations:
  - address: "0x8430493c7CC24Df1c130f9d729Ce4FCf40F05215"
    amount: 10
    pool: team
    type: cliffhanger
"#;
        assert!(matches!(
            Schedule::from_yaml_str(bad),
            Err(ScheduleError::UnknownKind(kind)) if kind == "cliffhanger"
        ));
    }

    #[test]
    fn malformed_address_rejected() {
        let bad = r#"
max_supply: 100
pools: {}
allocations:
  - address: "0x1234"
    amount: 10
    pool: team
    type: instant
"#;
        assert!(matches!(
            Schedule::from_yaml_str(bad),
            Err(ScheduleError::Address(_))
        ));
    }

    #[test]
    fn record_distribution_accumulates() {
        let mut pools: PoolRegistry =
            [Pool { name: "team".into(), total: 100 * COIN, distributed: 0 }]
                .into_iter()
                .collect();
        pools.record_distribution("team", 30 * COIN);
        pools.record_distribution("team", 20 * COIN);
        assert_eq!(pools.get("team").unwrap().distributed, 50 * COIN);
    }

    #[test]
    fn unknown_pool_is_skipped() {
        let mut pools = PoolRegistry::default();
        pools.record_distribution("ghost", 10);
        assert!(pools.get("ghost").is_none());
    }

    #[test]
    fn overshoot_is_kept_not_clamped() {
        let mut pools: PoolRegistry =
            [Pool { name: "team".into(), total: 10 * COIN, distributed: 0 }]
                .into_iter()
                .collect();
        pools.record_distribution("team", 15 * COIN);
        assert_eq!(pools.get("team").unwrap().distributed, 15 * COIN);
    }
}
