//! # ember-engine — the end-to-end batch computation.
//!
//! The orchestrator replays every emission day since program start,
//! merges registration seeds, cluster throttling, and vesting into
//! settled / pending / estimated ledgers, and reconciles against
//! previously-minted amounts. External collaborators (registration,
//! snapshot, mint-history, balance and allocation sources; publish and
//! mint sinks) are ports: async traits wired by the caller. Fetched
//! snapshots are memoized through a [`store::SnapshotStore`] so a day is
//! fetched at most once per program lifetime.

pub mod mint;
pub mod orchestrator;
pub mod ports;
pub mod store;

pub use mint::{mint_pending, plan_batches};
pub use orchestrator::{compute_points, reconcile, ComputeInputs, ComputedLedgers};
pub use ports::{
    AllocationSource, BalanceSource, MintHistorySource, MintReceipt, MintSink, PublishPayload,
    PublishSink, RegistrationSource, SnapshotSource,
};
pub use store::{CachingSnapshotProvider, MemorySnapshotStore, RocksSnapshotStore, SnapshotStore};
