//! Program constants. All monetary values in embers (1 EMBER = 10^8 embers).

pub const COIN: u64 = 100_000_000;

/// Hard cap on total EMBER supply across emission and vesting pools.
pub const MAX_SUPPLY: u64 = 60_000_000 * COIN;

/// Precision for ratios and multipliers (parts-per-billion).
pub const RATIO_PRECISION: u64 = 1_000_000_000;

/// Precision for the per-day decay retention factor.
///
/// One extra decimal digit over [`RATIO_PRECISION`] so that compounding a
/// rate like 0.99722 over three years of days keeps sub-ppb resolution.
pub const DECAY_PRECISION: u64 = 10_000_000_000;

/// Implicit self-stake credited to every active node, in embers.
pub const NODE_SELF_STAKE: u64 = 200_000 * COIN;

/// Score below which a node or resource node earns nothing.
pub const SCORE_FLOOR_PPB: u64 = 200_000_000;
/// Score at or above which the score multiplier saturates at 1.
pub const SCORE_CEIL_PPB: u64 = 800_000_000;

/// Holding ratio below which the holding multiplier is zero.
pub const HOLDING_FLOOR_PPB: u64 = 400_000_000;
/// Lower edge of the neutral holding band `[0.9, 1.0]`.
pub const HOLDING_PAR_PPB: u64 = 900_000_000;

/// Linkage floor: a node with zero paid resource nodes keeps 70%.
pub const LINKAGE_BASE_PPB: u64 = 700_000_000;
/// Linkage gain per paid resource node, capped at 1.0 overall.
pub const LINKAGE_PER_PAID_PPB: u64 = 100_000_000;

pub const SECS_PER_DAY: i64 = 86_400;
pub const MINUTES_PER_DAY: u64 = 1_440;
pub const DAYS_PER_YEAR: u64 = 365;
pub const MONTHS_PER_YEAR: u64 = 12;

// --- Default settings, overridable via EMBER_* environment variables ---

/// 0.99722 per day at [`DECAY_PRECISION`].
pub const DEFAULT_DAILY_DECAY: u64 = 9_972_200_000;
/// 1.5x at program start, decaying to 1.0 over the bonus window.
pub const DEFAULT_BONUS_RATIO_PPB: u64 = 1_500_000_000;
pub const DEFAULT_BONUS_DURATION_DAYS: u64 = 365;
/// Share of the staker emission base actually distributed to stakers.
pub const DEFAULT_STAKED_RATIO_PPB: u64 = 700_000_000;
pub const DEFAULT_STAKERS_DAILY_BASE: u64 = 15_000 * COIN;
pub const DEFAULT_NODES_DAILY_BASE: u64 = 15_000 * COIN;
pub const DEFAULT_RESOURCE_NODE_MONTHLY_BASE: u64 = 250 * COIN;
pub const DEFAULT_RESOURCE_NODE_MONTHLY_VARIABLE: u64 = 1_250 * COIN;
pub const DEFAULT_MAX_PAID_RESOURCE_NODES: usize = 5;
/// Seed grant for every registered address.
pub const DEFAULT_SIGNUP_BONUS: u64 = COIN;
/// Seed grant for each address on the static bonus list.
pub const DEFAULT_BONUS_ADDRESS_GRANT: u64 = 100 * COIN;
/// Clusters with fewer previously-minted tokens than this keep a 1x multiplier.
pub const DEFAULT_CLUSTER_MIN_MINTED: u64 = 100 * COIN;
/// Pending entries at or below this amount are left out of mint batches.
pub const DEFAULT_MINT_MIN_AMOUNT: u64 = COIN / 20;
pub const DEFAULT_MINT_BATCH_SIZE: usize = 400;
pub const DEFAULT_MINT_PAUSE_SECS: u64 = 5;
/// Three years, in days.
pub const DEFAULT_ESTIMATE_HORIZON_DAYS: u64 = 1_095;

/// Program emission start: 2024-01-01T00:00:00Z.
pub const DEFAULT_PROGRAM_START: i64 = 1_704_067_200;
/// Vesting (token generation) start: 2024-06-18T12:00:00Z.
pub const DEFAULT_VESTING_START: i64 = 1_718_712_000;
/// Registration cutoff for the early bonus: 2024-02-26T12:00:00Z.
pub const DEFAULT_BONUS_CUTOFF: i64 = 1_708_948_800;
