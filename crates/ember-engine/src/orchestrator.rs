//! The run state machine: seed, replay, cluster, vest, reconcile, project.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use ember_cluster::ClusterGraph;
use ember_core::config::Settings;
use ember_core::error::SnapshotError;
use ember_core::time;
use ember_core::types::{Amount, InfoMetadata, RegistrationBook, RewardLedger};
use ember_core::{Address, EmberError};
use ember_emission::mul_ratio;
use ember_rounds::{DayContext, RoundProcessor};
use ember_vesting::{instant_allocation_totals, linear_allocation_totals, Schedule};

use crate::ports::SnapshotSource;
use crate::store::{CachingSnapshotProvider, SnapshotStore};

/// Everything the run needs besides snapshots, gathered up front.
pub struct ComputeInputs {
    pub registrations: RegistrationBook,
    pub previous_mints: BTreeMap<Address, Amount>,
    pub balances: BTreeMap<Address, Amount>,
    pub schedule: Schedule,
    /// Time of the most recent on-chain distribution, if any.
    pub last_mint_time: Option<i64>,
    /// The instant this run computes "as of".
    pub now: i64,
}

/// The three output ledgers plus publish metadata.
#[derive(Debug, Clone)]
pub struct ComputedLedgers {
    /// Amounts already reflected as minted.
    pub settled: RewardLedger,
    /// Computed but not yet issued; the mint candidate set.
    pub pending: RewardLedger,
    /// Three-year projection under a nothing-changes assumption.
    pub estimated: RewardLedger,
    pub info: InfoMetadata,
    /// Pool distribution counters after resolving the full schedule.
    pub pools: ember_vesting::PoolRegistry,
}

/// Run the complete batch computation.
///
/// Days are replayed strictly oldest to newest: decay and the bonus
/// window depend on the day index, and clustering must have seen every
/// day before it is finalized. A missing historical day aborts the run;
/// a missing *today* is tolerated (the day may simply not be recorded
/// yet).
pub async fn compute_points<S: SnapshotSource, T: SnapshotStore>(
    settings: &Settings,
    provider: &CachingSnapshotProvider<S, T>,
    inputs: &ComputeInputs,
) -> Result<ComputedLedgers, EmberError> {
    settings.validate()?;

    let start = settings.start_date();
    let today = time::date_of(inputs.now);

    // Seed: static bonus grants plus the per-registrant signup bonus.
    let mut raw = RewardLedger::new();
    for address in &settings.bonus_addresses {
        raw.credit(address, settings.bonus_address_grant);
    }
    for (address, _) in inputs.registrations.iter() {
        raw.credit(address, settings.signup_bonus);
    }

    let processor = RoundProcessor::new(settings, &inputs.registrations);
    let mut links = ClusterGraph::new();

    // Replay settled history at full weight.
    let mut date = start;
    while date < today {
        let snapshot = provider
            .day(date, today)
            .await?
            .ok_or(SnapshotError::MissingDay(date))?;
        let ctx = DayContext::full(date, settings.day_index(date));
        processor.process(ctx, &snapshot, &mut raw, &mut links)?;
        date = next_day(date)?;
    }

    // Today: a partial-weight pass into pending (the slice since the last
    // distribution) and a full-weight pass into settled, so the settled
    // total always reads "as if distributed completely to date".
    let mut pending = RewardLedger::new();
    let today_snapshot = provider.day(today, today).await?;
    let today_index = settings.day_index(today);
    if let Some(snapshot) = &today_snapshot {
        let pending_ratio = time::partial_day_ratio(today, inputs.now, inputs.last_mint_time);
        processor.process(
            DayContext::partial(today, today_index, pending_ratio),
            snapshot,
            &mut pending,
            &mut links,
        )?;
        processor.process(
            DayContext::full(today, today_index),
            snapshot,
            &mut raw,
            &mut links,
        )?;
    } else {
        tracing::info!(%today, "no snapshot for today yet; pending round skipped");
    }

    // Projection base: replay today's snapshot unchanged across the
    // horizon. Future rounds still record links, which is idempotent.
    let mut estimated = raw.clone();
    if let Some(snapshot) = &today_snapshot {
        for offset in 1..=settings.estimate_horizon_days {
            let ctx = DayContext::full(today, today_index + offset);
            processor.process(ctx, snapshot, &mut estimated, &mut links)?;
        }
    }

    // Clustering is only valid once every day's links are known.
    let clusters = links.finalize();

    // Throttle pending and the projection by cluster-level holdings.
    // Settled history is fact and is never rescaled.
    let throttle = |ledger: &mut RewardLedger| {
        ledger.rescale(|address, amount| {
            mul_ratio(
                amount,
                clusters.multiplier_ppb(
                    address,
                    &inputs.previous_mints,
                    &inputs.balances,
                    settings.cluster_min_minted,
                ),
            )
        });
    };
    throttle(&mut pending);
    throttle(&mut estimated);

    // Vesting: the full schedule resolves into settled; addresses that
    // have minted before additionally accrue the linear delta since the
    // last distribution into pending. Never-minted addresses receive
    // their entire accrued amount through the reconciliation split below.
    let mut pools = inputs.schedule.pools.clone();
    let instant = instant_allocation_totals(&inputs.schedule.allocations, Some(&mut pools));
    let linear = linear_allocation_totals(
        &inputs.schedule.allocations,
        settings.vesting_start,
        inputs.now,
        None,
        Some(&mut pools),
    );
    for (address, amount) in instant.iter().chain(linear.iter()) {
        raw.credit(address, *amount);
    }

    if inputs.last_mint_time.is_some() {
        let accrued_since_mint = linear_allocation_totals(
            &inputs.schedule.allocations,
            settings.vesting_start,
            inputs.now,
            inputs.last_mint_time,
            None,
        );
        for (address, amount) in &accrued_since_mint {
            if inputs.previous_mints.contains_key(address) {
                pending.credit(address, *amount);
            }
        }
    }

    // Projection gets the schedule resolved at the horizon date.
    let horizon_ts =
        inputs.now + settings.estimate_horizon_days as i64 * ember_core::constants::SECS_PER_DAY;
    let horizon_instant = instant_allocation_totals(&inputs.schedule.allocations, None);
    let horizon_linear = linear_allocation_totals(
        &inputs.schedule.allocations,
        settings.vesting_start,
        horizon_ts,
        None,
        None,
    );
    for (address, amount) in horizon_instant.iter().chain(horizon_linear.iter()) {
        estimated.credit(address, *amount);
    }

    // Reconciliation: split raw into settled baseline and pending surplus.
    let (settled, owed) = reconcile(&raw, &inputs.previous_mints);
    pending.merge(&owed);

    let bonus_addresses = inputs
        .registrations
        .registered_before(inputs.now, settings.bonus_cutoff)
        .count()
        + settings.bonus_addresses.len();
    let info = InfoMetadata {
        run_time: inputs.now,
        last_mint_time: inputs.last_mint_time,
        total_addresses: raw.len(),
        bonus_addresses,
    };

    tracing::info!(
        addresses = raw.len(),
        settled_total = settled.total(),
        pending_total = pending.total(),
        estimated_total = estimated.total(),
        clusters = clusters.len(),
        "computation complete"
    );

    Ok(ComputedLedgers { settled, pending, estimated, info, pools })
}

/// Split computed totals into a settled baseline and a pending surplus.
///
/// Addresses with a previous mint keep the already-minted amount as
/// settled; anything computed beyond it moves to pending. Addresses never
/// minted move their whole computed amount to pending. Whenever
/// `previous_mint <= raw`, the split conserves `raw == settled + owed`.
pub fn reconcile(
    raw: &RewardLedger,
    previous_mints: &BTreeMap<Address, Amount>,
) -> (RewardLedger, RewardLedger) {
    let mut settled = RewardLedger::new();
    let mut owed = RewardLedger::new();
    for (address, amount) in raw.iter() {
        match previous_mints.get(address) {
            Some(&minted) => {
                settled.credit(address, minted);
                owed.credit(address, amount.saturating_sub(minted));
            }
            None => owed.credit(address, amount),
        }
    }
    (settled, owed)
}

fn next_day(date: NaiveDate) -> Result<NaiveDate, EmberError> {
    date.succ_opt().ok_or_else(|| {
        EmberError::Source(format!("calendar overflow advancing past {date}"))
    })
}
