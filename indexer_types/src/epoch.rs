use beacon_time::Epoch;
use serde::{Deserialize, Serialize};

/// Progress flags on a persisted `Epoch` row. Every field starts `false` and
/// flips to `true` exactly once; `processed` is the terminal flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EpochFlags {
    pub processed: bool,
    pub rewards_fetched: bool,
    pub validators_balances_fetched: bool,
    pub committees_fetched: bool,
    pub slots_fetched: bool,
    pub sync_committees_fetched: bool,
    pub validators_activation_fetched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: Epoch,
    pub flags: EpochFlags,
}

impl EpochRecord {
    pub fn new(epoch: Epoch) -> Self {
        Self {
            epoch,
            flags: EpochFlags::default(),
        }
    }
}
