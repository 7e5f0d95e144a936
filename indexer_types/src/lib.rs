//! Shared, serde-level data model for the indexer: the §3 entities, the
//! beacon-API JSON shapes consumed by `indexer_http`, and the `MaybeMissed`
//! sentinel propagated through every call that may hit a missed slot.

pub mod block;
pub mod committee;
pub mod epoch;
pub mod missed;
pub mod rewards;
pub mod serde_utils;
pub mod slot;
pub mod sync_committee;
pub mod validator;

pub use beacon_time::{BeaconTime, ChainParams, Epoch, EpochSlots, Slot, SyncPeriodRange};
pub use block::*;
pub use committee::*;
pub use epoch::*;
pub use missed::MaybeMissed;
pub use rewards::*;
pub use slot::*;
pub use sync_committee::*;
pub use validator::*;
