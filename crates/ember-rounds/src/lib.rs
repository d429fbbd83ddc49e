//! # ember-rounds — one emission day, one ledger delta.
//!
//! The round processor takes a single day's [`NetworkSnapshot`] and
//! accumulates that day's emission into a running ledger:
//!
//! 1. stakers earn from a budget scaled by network growth, decay and the
//!    staked ratio, pro-rata over stake (each node carries an implicit
//!    self-stake);
//! 2. resource nodes earn a score-weighted slice of their monthly rate,
//!    capped per node and in declaration order;
//! 3. nodes earn an equal split of the decayed node base, discounted by
//!    linkage and score;
//! 4. early registrants get the decaying bonus multiplier on everything
//!    they receive that day.
//!
//! Every payment is weighted by the day ratio (1.0 for historical days,
//! partial for today) and every observed `(owner, reward)` pair is
//! recorded into the cluster graph. Days are processed oldest to newest;
//! the processor itself is stateless across days.

mod round;

pub use round::{DayContext, RoundProcessor, RoundSummary};
