use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The canonical per-hour aggregate, keyed on `(datetime, validator_index)`,
/// updated by additive upserts (spec §3 "HourlyValidatorStats", §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HourlyValidatorStatsDelta {
    pub cl_rewards: i64,
    pub cl_missed_rewards: i64,
    pub attestations_count: u32,
    pub head: i64,
    pub target: i64,
    pub source: i64,
    pub inactivity: i64,
    pub missed_head: i64,
    pub missed_target: i64,
    pub missed_source: i64,
    pub missed_inactivity: i64,
    pub sync_committee: u32,
    pub block_reward: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HourlyValidatorStatsKey {
    pub validator_index: u64,
}

/// Raw `POST /eth/v1/beacon/rewards/attestations/{epoch}` response entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttestationRewardEntry {
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub validator_index: u64,
    #[serde(with = "crate::serde_utils::quoted_i64")]
    pub head: i64,
    #[serde(with = "crate::serde_utils::quoted_i64")]
    pub target: i64,
    #[serde(with = "crate::serde_utils::quoted_i64")]
    pub source: i64,
    #[serde(with = "crate::serde_utils::quoted_i64")]
    pub inactivity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealAttestationReward {
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub effective_balance: u64,
    #[serde(with = "crate::serde_utils::quoted_i64")]
    pub head: i64,
    #[serde(with = "crate::serde_utils::quoted_i64")]
    pub target: i64,
    #[serde(with = "crate::serde_utils::quoted_i64")]
    pub source: i64,
    #[serde(with = "crate::serde_utils::quoted_i64")]
    pub inactivity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttestationRewardsResponse {
    pub data: AttestationRewardsData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttestationRewardsData {
    pub ideal_rewards: Vec<IdealAttestationReward>,
    pub total_rewards: Vec<AttestationRewardEntry>,
}

/// Floors a balance to the nearest 1-gwei-granularity effective-balance
/// bucket, per spec §4.4 "Ideal-reward bucketing" / §8 property 6.
pub const EFFECTIVE_BALANCE_INCREMENT: u64 = 1_000_000_000;

pub fn effective_balance_bucket(balance: u64) -> u64 {
    (balance / EFFECTIVE_BALANCE_INCREMENT) * EFFECTIVE_BALANCE_INCREMENT
}

/// The per-(validator, hour) delta computed by combining one validator's
/// actual reward entry against its matching ideal reward. `missed* = ideal*
/// - actual*`, sign-preserving except when they're equal (spec §4.4).
pub fn compute_reward_delta(
    actual: &AttestationRewardEntry,
    ideal: &IdealAttestationReward,
) -> HourlyValidatorStatsDelta {
    let missed = |ideal: i64, actual: i64| if ideal == actual { 0 } else { ideal - actual };
    HourlyValidatorStatsDelta {
        cl_rewards: actual.head + actual.target + actual.source + actual.inactivity,
        cl_missed_rewards: missed(ideal.head, actual.head)
            + missed(ideal.target, actual.target)
            + missed(ideal.source, actual.source)
            + missed(ideal.inactivity, actual.inactivity),
        attestations_count: 1,
        head: actual.head,
        target: actual.target,
        source: actual.source,
        inactivity: actual.inactivity,
        missed_head: missed(ideal.head, actual.head),
        missed_target: missed(ideal.target, actual.target),
        missed_source: missed(ideal.source, actual.source),
        missed_inactivity: missed(ideal.inactivity, actual.inactivity),
        sync_committee: 0,
        block_reward: 0,
    }
}

/// `GET /eth/v1/beacon/rewards/blocks/{slot}` response payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockRewardsData {
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub proposer_index: u64,
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub total: u64,
}

/// `POST /eth/v1/beacon/rewards/sync_committee/{slot}` response entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncCommitteeRewardEntry {
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub validator_index: u64,
    #[serde(with = "crate::serde_utils::quoted_i64")]
    pub reward: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReward {
    pub block_number: u64,
    pub address: String,
    pub timestamp: DateTime<Utc>,
    pub amount: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucketing_floors_to_one_gwei_granularity() {
        assert_eq!(effective_balance_bucket(32_999_999_999), 32_000_000_000);
        assert_eq!(effective_balance_bucket(32_000_000_000), 32_000_000_000);
        assert_eq!(effective_balance_bucket(999_999_999), 0);
    }

    #[test]
    fn missed_is_zero_only_when_equal() {
        let actual = AttestationRewardEntry { validator_index: 1, head: 10, target: 10, source: 10, inactivity: 0 };
        let ideal = IdealAttestationReward { effective_balance: 32_000_000_000, head: 10, target: 12, source: 10, inactivity: -1 };
        let delta = compute_reward_delta(&actual, &ideal);
        assert_eq!(delta.missed_head, 0);
        assert_eq!(delta.missed_target, 2);
        assert_eq!(delta.missed_source, 0);
        assert_eq!(delta.missed_inactivity, -1);
        assert_eq!(delta.cl_rewards, 30);
    }

    #[test]
    fn s2_validator_cumulative_reward_across_two_epochs() {
        // Scenario S2: validator 549417's rewards across two consecutive epochs.
        let epoch_a = AttestationRewardEntry { validator_index: 549417, head: 30000, target: 30000, source: 27524, inactivity: 0 };
        let epoch_b = AttestationRewardEntry { validator_index: 549417, head: 30000, target: 30000, source: 27929, inactivity: 0 };
        let sum_a: i64 = epoch_a.head + epoch_a.target + epoch_a.source + epoch_a.inactivity;
        let sum_b: i64 = epoch_b.head + epoch_b.target + epoch_b.source + epoch_b.inactivity;
        assert_eq!(sum_a, 87524);
        assert_eq!(sum_b, 87929);
    }
}
