//! Emission curves: score, holding, decay, bonus, linkage, growth.

use ember_core::constants::{
    DECAY_PRECISION, HOLDING_FLOOR_PPB, HOLDING_PAR_PPB, LINKAGE_BASE_PPB, LINKAGE_PER_PAID_PPB,
    RATIO_PRECISION, SCORE_CEIL_PPB, SCORE_FLOOR_PPB,
};

use crate::fixed::{fixed_log10, fixed_pow, fixed_sqrt, mul_div};

/// Performance score multiplier, in ppb.
///
/// Zero below 0.2, one at or above 0.8, linear in between. Output is
/// always in `[0, 1]`.
pub fn score_multiplier_ppb(score_ppb: u64) -> u64 {
    if score_ppb < SCORE_FLOOR_PPB {
        return 0;
    }
    if score_ppb >= SCORE_CEIL_PPB {
        return RATIO_PRECISION;
    }
    mul_div(
        score_ppb - SCORE_FLOOR_PPB,
        RATIO_PRECISION,
        SCORE_CEIL_PPB - SCORE_FLOOR_PPB,
    )
    .min(RATIO_PRECISION)
}

/// Holding-ratio multiplier, in ppb. `held_ratio_ppb` is
/// `total_held / total_minted` for an address or cluster.
///
/// - below 0.4: 0 (sold nearly everything)
/// - `[0.4, 0.9)`: `1 - sqrt(0.9 - ratio)` (square-root penalty)
/// - `[0.9, 1.0]`: exactly 1 (par band)
/// - above 1.0: `1 + sqrt(ratio - 1) / 2` (mild accumulator boost)
///
/// Continuous at 0.9 and at 1.0.
pub fn holding_multiplier_ppb(held_ratio_ppb: u64) -> u64 {
    if held_ratio_ppb < HOLDING_FLOOR_PPB {
        return 0;
    }
    if held_ratio_ppb < HOLDING_PAR_PPB {
        return RATIO_PRECISION.saturating_sub(fixed_sqrt(HOLDING_PAR_PPB - held_ratio_ppb));
    }
    if held_ratio_ppb > RATIO_PRECISION {
        return RATIO_PRECISION + fixed_sqrt(held_ratio_ppb - RATIO_PRECISION) / 2;
    }
    RATIO_PRECISION
}

/// Compound decay factor for an emission day, at [`DECAY_PRECISION`].
///
/// `decay^day_index`, compounding once per elapsed program day.
pub fn decay_factor(day_index: u64, daily_decay: u64) -> u64 {
    fixed_pow(daily_decay, day_index, DECAY_PRECISION)
}

/// Early-registration bonus multiplier for an emission day, in ppb.
///
/// Starts at `bonus_ratio` on day 0 and decays linearly to 1.0 at
/// `duration_days`, staying at 1.0 afterwards.
pub fn bonus_multiplier_ppb(day_index: u64, bonus_ratio_ppb: u64, duration_days: u64) -> u64 {
    if day_index >= duration_days || bonus_ratio_ppb <= RATIO_PRECISION {
        return RATIO_PRECISION;
    }
    let surplus = bonus_ratio_ppb - RATIO_PRECISION;
    RATIO_PRECISION + mul_div(surplus, duration_days - day_index, duration_days)
}

/// Linkage factor for a node, in ppb.
///
/// `0.7 + 0.1 * paid_resource_nodes`, capped at 1.0: a node with no paid
/// resource nodes keeps 70% of its share; three or more paid make it whole.
pub fn linkage_ppb(paid_resource_nodes: usize) -> u64 {
    LINKAGE_BASE_PPB
        .saturating_add(LINKAGE_PER_PAID_PPB.saturating_mul(paid_resource_nodes as u64))
        .min(RATIO_PRECISION)
}

/// Network growth factor applied to the staker emission base, in ppb.
///
/// `(log10(active_nodes) + 1) / 3`: sub-linear in node count, equal to
/// one at 100 active nodes.
pub fn growth_factor_ppb(active_nodes: u64) -> u64 {
    (fixed_log10(active_nodes) + RATIO_PRECISION) / 3
}
