//! L2/L3: rate-limited, retrying, fallback-capable HTTP access to the
//! upstream consensus node pair, and the typed facade built on top of it.

pub mod beacon_api;
pub mod client;
pub mod error;
pub mod execution;
pub mod memo;
pub mod pool;

pub use beacon_api::BeaconApiClient;
pub use client::{missed_on_404, ReliableRequestClient};
pub use error::Error;
pub use execution::ExecutionClient;
pub use pool::{is_indexer_delayed, Pool, PoolConfig, PoolKind, PoolPair};
