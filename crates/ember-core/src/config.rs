//! Run configuration.
//!
//! Every tunable of the emission model lives here with a typed field and a
//! default declared exactly once. [`Settings::from_env`] layers `EMBER_*`
//! environment variables over the defaults; [`Settings::validate`] rejects
//! out-of-domain values before any computation starts.
//!
//! Units are fixed point: amounts in embers (10^8 per EMBER), ratios in
//! ppb, the decay rate at [`DECAY_PRECISION`]. Timestamps are unix seconds.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::address::Address;
use crate::constants::*;
use crate::error::ConfigError;
use crate::time;
use crate::types::Amount;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Emission day 0 boundary.
    pub program_start: i64,
    /// Vesting clock start (token generation event).
    pub vesting_start: i64,
    /// Latest registration time still eligible for the early bonus.
    pub bonus_cutoff: i64,
    /// Per-day retention factor at [`DECAY_PRECISION`].
    pub daily_decay: u64,
    /// Bonus multiplier at day 0, in ppb.
    pub bonus_ratio_ppb: u64,
    /// Days over which the bonus decays back to 1.0.
    pub bonus_duration_days: u64,
    /// Share of the staker emission base distributed to stakers, in ppb.
    pub staked_ratio_ppb: u64,
    pub stakers_daily_base: Amount,
    pub nodes_daily_base: Amount,
    pub resource_node_monthly_base: Amount,
    pub resource_node_monthly_variable: Amount,
    /// Per node, resource nodes beyond this cap earn nothing.
    pub max_paid_resource_nodes: usize,
    /// Seed grant for every registrant.
    pub signup_bonus: Amount,
    /// Seed grant for each static bonus address.
    pub bonus_address_grant: Amount,
    /// Addresses granted the bonus regardless of registration time.
    pub bonus_addresses: Vec<Address>,
    /// Clusters minted less than this keep a 1x holding multiplier.
    pub cluster_min_minted: Amount,
    /// Pending entries at or below this amount are not minted.
    pub mint_min_amount: Amount,
    pub mint_batch_size: usize,
    /// Pause between mint batch submissions.
    pub mint_pause_secs: u64,
    /// Projection horizon for the estimated ledger, in days.
    pub estimate_horizon_days: u64,
    /// Root directory for the snapshot cache and file-backed adapters.
    pub data_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ember");

        Self {
            program_start: DEFAULT_PROGRAM_START,
            vesting_start: DEFAULT_VESTING_START,
            bonus_cutoff: DEFAULT_BONUS_CUTOFF,
            daily_decay: DEFAULT_DAILY_DECAY,
            bonus_ratio_ppb: DEFAULT_BONUS_RATIO_PPB,
            bonus_duration_days: DEFAULT_BONUS_DURATION_DAYS,
            staked_ratio_ppb: DEFAULT_STAKED_RATIO_PPB,
            stakers_daily_base: DEFAULT_STAKERS_DAILY_BASE,
            nodes_daily_base: DEFAULT_NODES_DAILY_BASE,
            resource_node_monthly_base: DEFAULT_RESOURCE_NODE_MONTHLY_BASE,
            resource_node_monthly_variable: DEFAULT_RESOURCE_NODE_MONTHLY_VARIABLE,
            max_paid_resource_nodes: DEFAULT_MAX_PAID_RESOURCE_NODES,
            signup_bonus: DEFAULT_SIGNUP_BONUS,
            bonus_address_grant: DEFAULT_BONUS_ADDRESS_GRANT,
            bonus_addresses: Vec::new(),
            cluster_min_minted: DEFAULT_CLUSTER_MIN_MINTED,
            mint_min_amount: DEFAULT_MINT_MIN_AMOUNT,
            mint_batch_size: DEFAULT_MINT_BATCH_SIZE,
            mint_pause_secs: DEFAULT_MINT_PAUSE_SECS,
            estimate_horizon_days: DEFAULT_ESTIMATE_HORIZON_DAYS,
            data_dir,
        }
    }
}

impl Settings {
    /// Defaults layered with `EMBER_*` environment variables.
    ///
    /// List values (`EMBER_BONUS_ADDRESSES`) are comma-separated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings: Settings = config::Config::builder()
            .add_source(
                config::Config::try_from(&Settings::default())
                    .map_err(|e| ConfigError::Environment(e.to_string()))?,
            )
            .add_source(
                config::Environment::with_prefix("EMBER")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("bonus_addresses"),
            )
            .build()
            .map_err(|e| ConfigError::Environment(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ConfigError::Environment(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject configurations outside the model's domain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid { name, reason: reason.into() }
        }

        if self.daily_decay == 0 || self.daily_decay > DECAY_PRECISION {
            return Err(invalid("daily_decay", "must be in (0, 1]"));
        }
        if self.bonus_ratio_ppb < RATIO_PRECISION {
            return Err(invalid("bonus_ratio_ppb", "must be >= 1.0"));
        }
        if self.bonus_duration_days == 0 {
            return Err(invalid("bonus_duration_days", "must be positive"));
        }
        if self.staked_ratio_ppb == 0 || self.staked_ratio_ppb > RATIO_PRECISION {
            return Err(invalid("staked_ratio_ppb", "must be in (0, 1]"));
        }
        if self.stakers_daily_base == 0 || self.nodes_daily_base == 0 {
            return Err(invalid("emission bases", "must be positive"));
        }
        if self.max_paid_resource_nodes == 0 {
            return Err(invalid("max_paid_resource_nodes", "must be positive"));
        }
        if self.mint_batch_size == 0 {
            return Err(invalid("mint_batch_size", "must be positive"));
        }
        if self.estimate_horizon_days == 0 {
            return Err(invalid("estimate_horizon_days", "must be positive"));
        }
        if self.program_start <= 0 {
            return Err(invalid("program_start", "must be a positive unix time"));
        }
        if self.vesting_start < self.program_start {
            return Err(invalid("vesting_start", "precedes program_start"));
        }
        if self.bonus_cutoff <= self.program_start {
            return Err(invalid("bonus_cutoff", "must follow program_start"));
        }
        Ok(())
    }

    /// Calendar date of emission day 0.
    pub fn start_date(&self) -> NaiveDate {
        time::date_of(self.program_start)
    }

    /// Emission day index of a date (0 for the start date).
    pub fn day_index(&self, date: NaiveDate) -> u64 {
        time::day_index(self.start_date(), date)
    }

    /// Directory holding the RocksDB snapshot cache.
    pub fn snapshot_db_path(&self) -> PathBuf {
        self.data_dir.join("snapshots")
    }
}
