//! Core types and configuration for the Ember points engine.
//!
//! All monetary values are in embers (1 EMBER = 10^8 embers) and all
//! ratios are parts-per-billion fixed point. Floating point exists only
//! at the serde boundary where external data carries fractional scores
//! and token amounts.

pub mod address;
pub mod config;
pub mod constants;
pub mod error;
pub mod time;
pub mod types;

pub use address::Address;
pub use config::Settings;
pub use error::EmberError;
pub use types::{Amount, NetworkSnapshot, RegistrationBook, RewardLedger};
