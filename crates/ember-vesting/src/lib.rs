//! # ember-vesting — pre-committed token pools and their release schedule.
//!
//! A schedule names pools ("team", "reserves", ...) and allocations
//! against them. Instant allocations resolve to their full amount as soon
//! as they are queried; linear allocations release minute-by-minute from
//! the vesting start (plus an optional cliff), clamped at the full
//! amount. Pool `distributed` counters track what has been resolved so
//! far; overshoot past a pool's total is reported, not clamped.

mod engine;
mod schedule;

pub use engine::{instant_allocation_totals, linear_allocation_totals};
pub use schedule::{Allocation, AllocationKind, Pool, PoolRegistry, Schedule};
