//! Error types for the Ember points engine.
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("missing 0x prefix")] MissingPrefix,
    #[error("invalid length: {0} hex digits, expected 40")] InvalidLength(usize),
    #[error("invalid hex character: {0}")] InvalidCharacter(char),
    #[error("mixed-case checksum mismatch")] ChecksumMismatch,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid setting {name}: {reason}")] Invalid { name: &'static str, reason: String },
    #[error("environment: {0}")] Environment(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoundError {
    #[error("no active nodes on {0}")] NoActiveNodes(NaiveDate),
    #[error("zero total stake on {0}")] ZeroTotalStake(NaiveDate),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("unknown allocation kind: {0}")] UnknownKind(String),
    #[error("linear allocation for {0} has no duration")] MissingDuration(String),
    #[error("zero-amount allocation for {0}")] ZeroAmount(String),
    #[error("allocation address: {0}")] Address(#[from] AddressError),
    #[error("schedule parse: {0}")] Parse(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store open: {0}")] Open(String),
    #[error("store read: {0}")] Read(String),
    #[error("store write: {0}")] Write(String),
    #[error("store decode: {0}")] Decode(String),
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot missing for {0}")] MissingDay(NaiveDate),
    #[error(transparent)] Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum EmberError {
    #[error(transparent)] Address(#[from] AddressError),
    #[error(transparent)] Config(#[from] ConfigError),
    #[error(transparent)] Round(#[from] RoundError),
    #[error(transparent)] Schedule(#[from] ScheduleError),
    #[error(transparent)] Snapshot(#[from] SnapshotError),
    #[error(transparent)] Store(#[from] StoreError),
    #[error("source: {0}")] Source(String),
    #[error("publish: {0}")] Publish(String),
    #[error("mint: {0}")] Mint(String),
}
