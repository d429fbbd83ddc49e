//! The per-day emission round.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use ember_cluster::ClusterGraph;
use ember_core::config::Settings;
use ember_core::constants::{
    DAYS_PER_YEAR, DECAY_PRECISION, MONTHS_PER_YEAR, NODE_SELF_STAKE, RATIO_PRECISION,
};
use ember_core::error::RoundError;
use ember_core::time;
use ember_core::types::{Amount, NetworkSnapshot, RegistrationBook, ResourceNodeStatus, RewardLedger};
use ember_core::Address;
use ember_emission::{
    bonus_multiplier_ppb, decay_factor, growth_factor_ppb, linkage_ppb, mul_div, mul_ratio,
    score_multiplier_ppb,
};

/// Which day is being replayed and at what weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayContext {
    pub date: NaiveDate,
    /// Whole days since program start; drives decay and the bonus window.
    pub day_index: u64,
    /// Fraction of the day to account for, in ppb. 1.0 for settled
    /// history, partial for today's pending slice.
    pub day_ratio_ppb: u64,
}

impl DayContext {
    /// A fully-weighted day.
    pub fn full(date: NaiveDate, day_index: u64) -> Self {
        Self { date, day_index, day_ratio_ppb: RATIO_PRECISION }
    }

    /// A partially-weighted day.
    pub fn partial(date: NaiveDate, day_index: u64, day_ratio_ppb: u64) -> Self {
        Self {
            date,
            day_index,
            day_ratio_ppb: day_ratio_ppb.min(RATIO_PRECISION),
        }
    }
}

/// What one round emitted, for logging and audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub date: NaiveDate,
    pub active_nodes: usize,
    pub total_staked: u128,
    pub paid_resource_nodes: usize,
    /// Total embers credited this round, after bonus and day weighting.
    pub emitted: Amount,
}

/// Stateless processor turning one day's snapshot into ledger credits.
pub struct RoundProcessor<'a> {
    settings: &'a Settings,
    registrations: &'a RegistrationBook,
}

impl<'a> RoundProcessor<'a> {
    pub fn new(settings: &'a Settings, registrations: &'a RegistrationBook) -> Self {
        Self { settings, registrations }
    }

    /// Accumulate one day's emission into `ledger`, recording observed
    /// owner/reward links into `links`.
    ///
    /// Fails loudly on a snapshot with no active nodes or no stake: both
    /// mean the upstream data is malformed, and skipping the day would
    /// corrupt the decay arithmetic of every later day.
    pub fn process(
        &self,
        ctx: DayContext,
        snapshot: &NetworkSnapshot,
        ledger: &mut RewardLedger,
        links: &mut ClusterGraph,
    ) -> Result<RoundSummary, RoundError> {
        let settings = self.settings;

        let active = snapshot.active_nodes();
        if active.is_empty() {
            return Err(RoundError::NoActiveNodes(ctx.date));
        }

        let total_staked: u128 = active
            .iter()
            .map(|node| {
                NODE_SELF_STAKE as u128
                    + node.stakers.values().map(|&s| s as u128).sum::<u128>()
            })
            .sum();
        if total_staked == 0 {
            return Err(RoundError::ZeroTotalStake(ctx.date));
        }

        let decay = decay_factor(ctx.day_index, settings.daily_decay);

        // Staker budget: base, scaled sub-linearly by network size, decayed,
        // then cut to the staked share.
        let growth = growth_factor_ppb(active.len() as u64);
        let stakers_budget = mul_ratio(
            mul_div(
                mul_ratio(settings.stakers_daily_base, growth),
                decay,
                DECAY_PRECISION,
            ),
            settings.staked_ratio_ppb,
        );

        // Node budget: equal split of the decayed base before score weighting.
        let node_budget = mul_div(settings.nodes_daily_base, decay, DECAY_PRECISION);
        let per_node = node_budget / active.len() as u64;

        let bonus = bonus_multiplier_ppb(
            ctx.day_index,
            settings.bonus_ratio_ppb,
            settings.bonus_duration_days,
        );
        let eligible: BTreeSet<&Address> = self
            .registrations
            .registered_before(time::day_end(ctx.date), settings.bonus_cutoff)
            .collect();
        let has_bonus = |address: &Address| {
            eligible.contains(address) || settings.bonus_addresses.contains(address)
        };

        let mut emitted: Amount = 0;
        let mut pay = |ledger: &mut RewardLedger, address: &Address, amount: Amount| {
            let mut weighted = mul_ratio(amount, ctx.day_ratio_ppb);
            if has_bonus(address) {
                weighted = mul_ratio(weighted, bonus);
            }
            emitted = emitted.saturating_add(weighted);
            ledger.credit(address, weighted);
        };

        let stake_share = |stake: Amount| -> Amount {
            let wide = stake as u128 * stakers_budget as u128 / total_staked;
            wide.min(u64::MAX as u128) as u64
        };

        let mut paid_resource_nodes = 0usize;
        for node in &active {
            let payout = node.payout_address();
            links.record_link(&node.hash, &node.owner, &payout);

            // Stake-proportional distribution, self-stake included.
            pay(ledger, &payout, stake_share(NODE_SELF_STAKE));
            for (staker, &stake) in &node.stakers {
                pay(ledger, staker, stake_share(stake));
            }

            // Resource nodes in declaration order, zero scores neither paid
            // nor counted, capped at the per-node maximum.
            let mut paid = 0usize;
            for hash in &node.resource_nodes {
                if paid >= settings.max_paid_resource_nodes {
                    break;
                }
                let Some(rn) = snapshot.resource_node(hash) else {
                    tracing::debug!(node = %node.hash, resource_node = %hash, "dangling resource node link");
                    continue;
                };
                if rn.status != ResourceNodeStatus::Linked {
                    continue;
                }
                let score_mult = score_multiplier_ppb(rn.score_ppb);
                if score_mult == 0 {
                    continue;
                }

                let monthly = settings.resource_node_monthly_base.saturating_add(mul_ratio(
                    settings.resource_node_monthly_variable,
                    rn.decentralization_ppb,
                ));
                let daily = mul_div(monthly, MONTHS_PER_YEAR, DAYS_PER_YEAR);
                let reward = mul_ratio(daily, score_mult);

                let rn_payout = rn.payout_address();
                links.record_link(&rn.hash, &rn.owner, &rn_payout);
                pay(ledger, &rn_payout, reward);
                paid += 1;
            }
            paid_resource_nodes += paid;

            let node_reward = mul_ratio(
                mul_ratio(per_node, linkage_ppb(paid)),
                score_multiplier_ppb(node.score_ppb),
            );
            pay(ledger, &payout, node_reward);
        }

        let summary = RoundSummary {
            date: ctx.date,
            active_nodes: active.len(),
            total_staked,
            paid_resource_nodes,
            emitted,
        };
        tracing::debug!(
            date = %summary.date,
            active_nodes = summary.active_nodes,
            paid_resource_nodes = summary.paid_resource_nodes,
            emitted = summary.emitted,
            "processed emission round"
        );
        Ok(summary)
    }
}
