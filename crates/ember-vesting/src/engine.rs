//! Allocation resolution as of an instant.

use std::collections::BTreeMap;

use ember_core::constants::{MINUTES_PER_DAY, SECS_PER_DAY};
use ember_core::types::Amount;
use ember_core::Address;
use ember_emission::mul_div;

use crate::schedule::{Allocation, AllocationKind, PoolRegistry};

/// Sum of all instant allocations per address.
///
/// When a pool registry is supplied, each pool's `distributed` counter is
/// incremented by the resolved amounts as a side effect.
pub fn instant_allocation_totals(
    allocations: &[Allocation],
    mut pools: Option<&mut PoolRegistry>,
) -> BTreeMap<Address, Amount> {
    let mut totals: BTreeMap<Address, Amount> = BTreeMap::new();
    for alloc in allocations {
        if alloc.kind != AllocationKind::Instant {
            continue;
        }
        *totals.entry(alloc.address.clone()).or_insert(0) += alloc.amount;
        if let Some(registry) = pools.as_deref_mut() {
            registry.record_distribution(&alloc.pool, alloc.amount);
        }
    }
    totals
}

/// Linear allocation amounts due as of `as_of`, per address.
///
/// For each linear allocation the amount due is
/// `min(total, total * elapsed_minutes / (duration_days * 1440))`, with
/// elapsed time measured from `max(from ?? vesting_start, cliff_end)` to
/// `as_of`. Passing a `from` timestamp therefore yields the *incremental*
/// amount accrued since that instant. Everything is zero before the
/// vesting start. Monotonically non-decreasing in `as_of`.
pub fn linear_allocation_totals(
    allocations: &[Allocation],
    vesting_start: i64,
    as_of: i64,
    from: Option<i64>,
    mut pools: Option<&mut PoolRegistry>,
) -> BTreeMap<Address, Amount> {
    let mut totals: BTreeMap<Address, Amount> = BTreeMap::new();
    if as_of < vesting_start {
        return totals;
    }

    for alloc in allocations {
        let AllocationKind::Linear { duration_days, cliff_days } = alloc.kind else {
            continue;
        };
        if duration_days == 0 {
            continue;
        }

        let cliff_end = vesting_start + cliff_days as i64 * SECS_PER_DAY;
        let lower = from.unwrap_or(vesting_start).max(cliff_end);
        let elapsed_minutes = ((as_of - lower).max(0) / 60) as u64;
        let total_minutes = duration_days * MINUTES_PER_DAY;
        let due = mul_div(alloc.amount, elapsed_minutes.min(total_minutes), total_minutes)
            .min(alloc.amount);

        if due == 0 {
            continue;
        }
        *totals.entry(alloc.address.clone()).or_insert(0) += due;
        if let Some(registry) = pools.as_deref_mut() {
            registry.record_distribution(&alloc.pool, due);
        }
    }
    totals
}
