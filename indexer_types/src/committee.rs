use beacon_time::Slot;
use serde::{Deserialize, Serialize};

/// Primary key `(slot, committee_index, aggregation_bits_index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitteeKey {
    pub slot: Slot,
    pub committee_index: u32,
    pub aggregation_bits_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Committee {
    pub key: CommitteeKey,
    pub validator_index: u64,
    /// Minimum observed inclusion distance (block slot - attested slot).
    pub attestation_delay: Option<u32>,
}

/// One entry of a `getCommittees(epoch)` response: all validators assigned
/// to `committee_index` for `slot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeApiEntry {
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub slot: u64,
    #[serde(with = "crate::serde_utils::quoted_u64")]
    pub index: u64,
    #[serde(with = "vec_quoted_u64")]
    pub validators: Vec<u64>,
}

mod vec_quoted_u64 {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &[u64], serializer: S) -> Result<S::Ok, S::Error> {
        let strings: Vec<String> = value.iter().map(|v| v.to_string()).collect();
        strings.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u64>, D::Error> {
        let strings: Vec<String> = Vec::deserialize(deserializer)?;
        strings
            .into_iter()
            .map(|s| s.parse().map_err(de::Error::custom))
            .collect()
    }
}

/// Expands `getCommittees` entries into the flat rows `saveCommitteesData`
/// persists, deriving `committees_count_in_slot` per slot along the way.
/// Validator indices are assigned creation order within a committee, which
/// is the order the upstream API returns them in (spec §3 "assigned at
/// creation, in epoch order").
pub fn expand_committees(entries: &[CommitteeApiEntry]) -> Vec<Committee> {
    let mut committees = Vec::new();
    for entry in entries {
        for (bit_index, validator_index) in entry.validators.iter().enumerate() {
            committees.push(Committee {
                key: CommitteeKey {
                    slot: Slot::new(entry.slot),
                    committee_index: entry.index as u32,
                    aggregation_bits_index: bit_index as u32,
                },
                validator_index: *validator_index,
                attestation_delay: None,
            });
        }
    }
    committees
}

/// Computes `committees_count_in_slot[committee_index] = validators.len()`
/// for every slot touched by a `getCommittees` response, ordered by
/// ascending committee index (spec §3 "Slot.committeesCountInSlot").
pub fn committees_count_per_slot(entries: &[CommitteeApiEntry]) -> std::collections::BTreeMap<u64, Vec<u32>> {
    use std::collections::BTreeMap;
    let mut by_slot: BTreeMap<u64, BTreeMap<u64, u32>> = BTreeMap::new();
    for entry in entries {
        by_slot
            .entry(entry.slot)
            .or_default()
            .insert(entry.index, entry.validators.len() as u32);
    }
    by_slot
        .into_iter()
        .map(|(slot, by_index)| {
            let max_index = by_index.keys().max().copied().unwrap_or(0);
            let mut counts = vec![0u32; max_index as usize + 1];
            for (idx, count) in by_index {
                counts[idx as usize] = count;
            }
            (slot, counts)
        })
        .collect()
}

/// Decodes an aggregation-bit position into a validator index, per spec §4.4
/// "Attestation delays": `validatorIndex = Σ_{i<committeeIndex} count[i] + b`,
/// provided `b < count[committeeIndex]`.
pub fn decode_validator_index(counts: &[u32], committee_index: u32, bit: u32) -> Option<u64> {
    let count = *counts.get(committee_index as usize)?;
    if bit >= count {
        return None;
    }
    let start: u64 = counts[..committee_index as usize].iter().map(|&c| c as u64).sum();
    Some(start + bit as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_index_decoding_matches_spec_invariant() {
        let counts = vec![4u32, 3, 5];
        // Committee 0: indices 0..4, committee 1: 4..7, committee 2: 7..12.
        assert_eq!(decode_validator_index(&counts, 0, 0), Some(0));
        assert_eq!(decode_validator_index(&counts, 0, 3), Some(3));
        assert_eq!(decode_validator_index(&counts, 1, 0), Some(4));
        assert_eq!(decode_validator_index(&counts, 2, 4), Some(11));
        assert_eq!(decode_validator_index(&counts, 1, 3), None);
        assert_eq!(decode_validator_index(&counts, 5, 0), None);
    }

    #[test]
    fn expand_committees_assigns_indices_in_order() {
        let entries = vec![CommitteeApiEntry {
            slot: 10,
            index: 2,
            validators: vec![100, 200, 300],
        }];
        let expanded = expand_committees(&entries);
        assert_eq!(expanded.len(), 3);
        assert_eq!(expanded[1].key.aggregation_bits_index, 1);
        assert_eq!(expanded[1].validator_index, 200);
    }

    #[test]
    fn committees_count_per_slot_orders_by_index() {
        let entries = vec![
            CommitteeApiEntry { slot: 10, index: 1, validators: vec![1, 2, 3] },
            CommitteeApiEntry { slot: 10, index: 0, validators: vec![9, 8] },
        ];
        let counts = committees_count_per_slot(&entries);
        assert_eq!(counts.get(&10), Some(&vec![2, 3]));
    }
}
