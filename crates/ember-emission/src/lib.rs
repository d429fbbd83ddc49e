//! # ember-emission — emission math for the Ember points engine.
//!
//! All calculations use integer arithmetic only for determinism:
//! - **Score curve**: piecewise-linear multiplier zeroing low-scored
//!   nodes and saturating at high scores.
//! - **Holding curve**: square-root penalty below par holdings, mild
//!   square-root boost above par.
//! - **Compound decay**: the day's emission budget shrinks as
//!   `rate^day_index` using fixed-point binary exponentiation.
//! - **Network growth**: the staker base scales with `(log10(n) + 1) / 3`,
//!   computed by fixed-point repeated squaring.
//!
//! Everything here is a pure function; state lives in the round processor
//! and orchestrator.

pub mod curves;
pub mod fixed;

pub use curves::{
    bonus_multiplier_ppb, decay_factor, growth_factor_ppb, holding_multiplier_ppb, linkage_ppb,
    score_multiplier_ppb,
};
pub use fixed::{fixed_log10, fixed_pow, fixed_sqrt, mul_div, mul_ratio};
