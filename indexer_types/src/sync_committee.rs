use beacon_time::Epoch;
use serde::{Deserialize, Serialize};

/// One sync-committee period's validator set. `validator_aggregates` groups
/// the 512 members into the 4 subcommittees of 128 used for sync
/// aggregation, per spec §3 "SyncCommittee".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncCommittee {
    pub from_epoch: Epoch,
    pub to_epoch: Epoch,
    pub validators: Vec<u64>,
    pub validator_aggregates: Vec<Vec<u64>>,
}

/// Raw `getSyncCommittees` response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncCommitteeApiResponse {
    #[serde(with = "quoted_u64_vec")]
    pub validators: Vec<u64>,
    pub validator_aggregates: Vec<Vec<String>>,
}

mod quoted_u64_vec {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &[u64], serializer: S) -> Result<S::Ok, S::Error> {
        let strings: Vec<String> = value.iter().map(|v| v.to_string()).collect();
        strings.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u64>, D::Error> {
        let strings: Vec<String> = Vec::deserialize(deserializer)?;
        strings.into_iter().map(|s| s.parse().map_err(de::Error::custom)).collect()
    }
}

impl SyncCommitteeApiResponse {
    pub fn into_sync_committee(self, from_epoch: Epoch, to_epoch: Epoch) -> Result<SyncCommittee, std::num::ParseIntError> {
        let validator_aggregates = self
            .validator_aggregates
            .into_iter()
            .map(|group| group.into_iter().map(|s| s.parse()).collect())
            .collect::<Result<Vec<Vec<u64>>, _>>()?;
        Ok(SyncCommittee {
            from_epoch,
            to_epoch,
            validators: self.validators,
            validator_aggregates,
        })
    }
}
