//! L4: idempotent, transactional persistence for the entities in §3, and
//! the business-rule operations §4.4 names (reward bucketing, attestation
//! delay attribution, cleanup). One function per business step; every
//! function either fully commits or fully rolls back.

pub mod attestation_rewards;
pub mod committees;
pub mod epochs;
pub mod error;
pub mod execution_rewards;
pub mod models;
pub mod pool;
pub mod schema;
pub mod slot_rewards;
pub mod slots;
pub mod sync_committees;
pub mod validators;

pub use diesel::pg::PgConnection;
pub use error::Error;
pub use pool::{PooledConnection, Store, MIGRATIONS};
