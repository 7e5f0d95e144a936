use beacon_time::{ChainParams, Slot};
use std::time::Duration;

/// Every tunable named in spec §6 that isn't a connection string.
#[derive(Debug, Clone, Copy)]
pub struct OrchestrationConfig {
    pub chain: ChainParams,
    /// `consensus.lookbackSlot` / `slotStartIndexing`: smallest slot this
    /// indexer will ever touch.
    pub lookback_slot: Slot,
    /// How far behind head a slot must be before it is processable.
    pub delay_slots_to_head: u64,
    /// Target size of the unprocessed-epoch window (default 5).
    pub max_unprocessed_epochs: u64,
    /// Cleanup threshold: committees with a delay at or below this are
    /// eligible for deletion once old enough.
    pub max_attestation_delay: u32,
}

impl OrchestrationConfig {
    pub fn slot_duration(&self) -> Duration {
        Duration::from_millis(self.chain.slot_duration_ms)
    }
}
