//! Pure, deterministic mapping between wall-clock time and the beacon
//! chain's slot / epoch / sync-committee-period coordinates.
//!
//! Every operation here is total: given the chain parameters fixed at
//! construction, there is no failure mode and no I/O. Everything above this
//! layer (the HTTP facade, the storage layer, the orchestrators) treats
//! `BeaconTime` as the single source of truth for "what slot is it".

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

macro_rules! newtype_u64 {
    ($name:ident) => {
        #[derive(
            Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            pub const fn new(n: u64) -> Self {
                Self(n)
            }

            pub const fn as_u64(self) -> u64 {
                self.0
            }

            pub fn saturating_sub(self, rhs: Self) -> Self {
                Self(self.0.saturating_sub(rhs.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(n: u64) -> Self {
                Self(n)
            }
        }

        impl Add<u64> for $name {
            type Output = Self;
            fn add(self, rhs: u64) -> Self {
                Self(self.0 + rhs)
            }
        }

        impl Sub<u64> for $name {
            type Output = Self;
            fn sub(self, rhs: u64) -> Self {
                Self(self.0 - rhs)
            }
        }
    };
}

newtype_u64!(Slot);
newtype_u64!(Epoch);

/// Inclusive `[start, end]` range of slots spanning one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochSlots {
    pub start_slot: Slot,
    pub end_slot: Slot,
}

/// Inclusive range of epochs spanning one sync-committee period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPeriodRange {
    pub from_epoch: Epoch,
    pub to_epoch: Epoch,
}

/// Chain parameters required to do slot/epoch/time math. One instance per
/// configured network (mainnet, gnosis, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    pub genesis_timestamp_ms: u64,
    pub slot_duration_ms: u64,
    pub slots_per_epoch: u64,
    pub epochs_per_sync_committee_period: u64,
}

impl ChainParams {
    pub const MAINNET: Self = Self {
        genesis_timestamp_ms: 1_606_824_023_000,
        slot_duration_ms: 12_000,
        slots_per_epoch: 32,
        epochs_per_sync_committee_period: 256,
    };

    pub const GNOSIS: Self = Self {
        genesis_timestamp_ms: 1_638_968_400_000,
        slot_duration_ms: 5_000,
        slots_per_epoch: 16,
        epochs_per_sync_committee_period: 512,
    };
}

/// Pure time math over a fixed set of `ChainParams`. Cheap to construct and
/// to clone; holds no mutable state.
#[derive(Debug, Clone, Copy)]
pub struct BeaconTime {
    params: ChainParams,
}

impl BeaconTime {
    pub fn new(params: ChainParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> ChainParams {
        self.params
    }

    pub fn slot_from_timestamp(&self, t_ms: u64) -> Slot {
        Slot(t_ms.saturating_sub(self.params.genesis_timestamp_ms) / self.params.slot_duration_ms)
    }

    pub fn timestamp_from_slot(&self, slot: Slot) -> u64 {
        self.params.genesis_timestamp_ms + slot.as_u64() * self.params.slot_duration_ms
    }

    pub fn epoch_from_slot(&self, slot: Slot) -> Epoch {
        Epoch(slot.as_u64() / self.params.slots_per_epoch)
    }

    pub fn epoch_from_timestamp(&self, t_ms: u64) -> Epoch {
        self.epoch_from_slot(self.slot_from_timestamp(t_ms))
    }

    pub fn epoch_slots(&self, epoch: Epoch) -> EpochSlots {
        let start = epoch.as_u64() * self.params.slots_per_epoch;
        EpochSlots {
            start_slot: Slot(start),
            end_slot: Slot(start + self.params.slots_per_epoch - 1),
        }
    }

    pub fn sync_period_start_epoch(&self, epoch: Epoch) -> Epoch {
        let period = self.params.epochs_per_sync_committee_period;
        Epoch((epoch.as_u64() / period) * period)
    }

    pub fn sync_period_range(&self, epoch: Epoch) -> SyncPeriodRange {
        let from_epoch = self.sync_period_start_epoch(epoch);
        let to_epoch = Epoch(from_epoch.as_u64() + self.params.epochs_per_sync_committee_period - 1);
        SyncPeriodRange { from_epoch, to_epoch }
    }

    /// Truncates a millisecond timestamp down to the start of its UTC hour.
    pub fn utc_hour(&self, t_ms: u64) -> DateTime<Utc> {
        let dt = DateTime::<Utc>::from_timestamp_millis(t_ms as i64).unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap());
        dt.with_minute(0)
            .and_then(|d| d.with_second(0))
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or(dt)
    }

    /// The UTC hour bucket for the start of a given epoch, used to attribute
    /// attestation rewards to `HourlyValidatorStats.datetime`.
    pub fn utc_hour_for_epoch_start(&self, epoch: Epoch) -> DateTime<Utc> {
        let start_slot = self.epoch_slots(epoch).start_slot;
        self.utc_hour(self.timestamp_from_slot(start_slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gnosis() -> BeaconTime {
        BeaconTime::new(ChainParams::GNOSIS)
    }

    #[test]
    fn slot_and_epoch_roundtrip() {
        let bt = gnosis();
        let slot = Slot(1525790 * 16 + 3);
        let ts = bt.timestamp_from_slot(slot);
        assert_eq!(bt.slot_from_timestamp(ts), slot);
        assert_eq!(bt.epoch_from_slot(slot), Epoch(1525790));
    }

    #[test]
    fn epoch_slots_are_contiguous() {
        let bt = BeaconTime::new(ChainParams {
            slots_per_epoch: 32,
            ..ChainParams::MAINNET
        });
        let a = bt.epoch_slots(Epoch(1000));
        let b = bt.epoch_slots(Epoch(1001));
        assert_eq!(a.end_slot.as_u64() + 1, b.start_slot.as_u64());
        assert_eq!(a.start_slot, Slot(32000));
        assert_eq!(a.end_slot, Slot(32031));
    }

    #[test]
    fn sync_period_covers_256_epochs() {
        let bt = BeaconTime::new(ChainParams::MAINNET);
        let range = bt.sync_period_range(Epoch(300));
        assert_eq!(range.from_epoch, Epoch(256));
        assert_eq!(range.to_epoch, Epoch(511));
        assert_eq!(range.to_epoch.as_u64() - range.from_epoch.as_u64() + 1, 256);
    }

    #[test]
    fn utc_hour_truncates_minutes_and_seconds() {
        let bt = gnosis();
        // 2024-01-01T00:00:00Z plus 90 minutes worth of slots.
        let genesis = bt.params().genesis_timestamp_ms;
        let ninety_minutes_ms = 90 * 60 * 1000;
        let hour = bt.utc_hour(genesis + ninety_minutes_ms);
        assert_eq!(hour.minute(), 0);
        assert_eq!(hour.second(), 0);
    }
}
