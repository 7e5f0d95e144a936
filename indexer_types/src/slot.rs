use beacon_time::Slot;
use serde::{Deserialize, Serialize};

/// Progress flags and derived fields on a persisted `Slot` row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotFlags {
    pub processed: bool,
    pub attestations_fetched: bool,
    pub sync_rewards_fetched: bool,
    pub block_rewards_fetched: bool,
    pub execution_rewards_fetched: bool,
    pub beacon_block_processed: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotRecord {
    pub slot: Slot,
    pub flags: SlotFlags,
    pub proposer_index: Option<u64>,
    pub consensus_reward: Option<u128>,
    /// `committees_count_in_slot[i]` is the number of validators assigned to
    /// committee `i` of this slot; populated once the enclosing epoch's
    /// committees are persisted.
    pub committees_count_in_slot: Option<Vec<u32>>,
    pub withdrawals: Option<String>,
    pub cl_deposits: Option<String>,
    pub cl_voluntary_exits: Option<String>,
    pub el_deposits: Option<String>,
    pub el_withdrawals: Option<String>,
    pub el_consolidations: Option<String>,
}

impl SlotRecord {
    pub fn new(slot: Slot) -> Self {
        Self {
            slot,
            ..Default::default()
        }
    }
}
