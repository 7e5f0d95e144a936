//! The business-rule functions invoked by the state-machine regions: one
//! HTTP round-trip (or a storage check that skips it) followed by one
//! storage write, per spec §4.4/§4.5.3/§4.5.5.

use crate::context::Context;
use crate::error::Error;
use beacon_time::{Epoch, Slot};
use indexer_types::committee;

pub async fn fetch_and_save_committees(ctx: &Context, epoch: Epoch) -> Result<(), Error> {
    let current_epoch = ctx.beacon_time.epoch_from_slot(ctx.current_slot());
    let entries = ctx.beacon_api.get_committees(epoch, current_epoch).await?;
    let counts = committee::committees_count_per_slot(&entries);
    let committees = committee::expand_committees(&entries);

    let mut conn = ctx.store.conn()?;
    match indexer_store::committees::save_committees_data(&mut conn, epoch, &counts, &committees) {
        Ok(()) | Err(indexer_store::Error::AlreadyFetched(_)) => Ok(()),
        Err(e) => Err(Error::Store(e)),
    }
}

pub async fn fetch_and_save_sync_committee(ctx: &Context, epoch: Epoch) -> Result<(), Error> {
    {
        let mut conn = ctx.store.conn()?;
        if indexer_store::sync_committees::get_sync_committee_for_epoch(&mut conn, epoch)?.is_some() {
            indexer_store::epochs::set_sync_committees_fetched(&mut conn, epoch)?;
            return Ok(());
        }
    }

    let range = ctx.beacon_time.sync_period_range(epoch);
    let first_slot = ctx.beacon_time.epoch_slots(range.from_epoch).start_slot;
    let response = ctx.beacon_api.get_sync_committees(epoch, first_slot).await?;
    let committee = response
        .into_sync_committee(range.from_epoch, range.to_epoch)
        .map_err(|e| Error::Store(indexer_store::Error::Migration(Box::new(e))))?;

    let mut conn = ctx.store.conn()?;
    indexer_store::sync_committees::upsert_sync_committee(&mut conn, epoch, &committee)?;
    Ok(())
}

/// `trackingValidatorsActivation`: re-polls every validator currently
/// stored pending and writes back whatever status the beacon API now
/// reports (spec §4.5.3 region 5).
pub async fn update_validator_statuses(ctx: &Context, epoch: Epoch) -> Result<(), Error> {
    let pending_ids = {
        let mut conn = ctx.store.conn()?;
        indexer_store::validators::pending_validator_ids(&mut conn)?
    };
    if pending_ids.is_empty() {
        return Ok(());
    }

    let state_id = ctx.beacon_time.epoch_slots(epoch).start_slot.as_u64().to_string();
    let current_epoch = ctx.beacon_time.epoch_from_slot(ctx.current_slot());
    let kind = crate::clock::pool_kind_for_epoch(current_epoch, epoch);
    let entries = ctx
        .beacon_api
        .get_validators(&state_id, &pending_ids, &[], kind)
        .await?;

    let mut conn = ctx.store.conn()?;
    indexer_store::validators::upsert_validators(&mut conn, &entries)?;
    Ok(())
}

/// `validatorsBalances`: refreshes the balance of every currently-active
/// validator as of the epoch's start slot (spec §4.5.3 region 6).
pub async fn fetch_and_save_validator_balances(ctx: &Context, epoch: Epoch) -> Result<(), Error> {
    let active_ids = {
        let mut conn = ctx.store.conn()?;
        indexer_store::validators::active_validator_ids(&mut conn)?
    };

    let state_id = ctx.beacon_time.epoch_slots(epoch).start_slot.as_u64().to_string();
    let current_epoch = ctx.beacon_time.epoch_from_slot(ctx.current_slot());
    let kind = crate::clock::pool_kind_for_epoch(current_epoch, epoch);
    let entries = ctx
        .beacon_api
        .get_validators_balances(&state_id, &active_ids, kind)
        .await?;

    let mut conn = ctx.store.conn()?;
    indexer_store::validators::upsert_validator_balances(&mut conn, epoch, &entries)?;
    Ok(())
}

/// `rewards`: requests attestation rewards for every reward-eligible
/// validator touched since genesis and merges them additively (spec §4.4
/// "Attestation rewards").
pub async fn fetch_and_save_attestation_rewards(ctx: &Context, epoch: Epoch) -> Result<(), Error> {
    let epoch_slots = ctx.beacon_time.epoch_slots(epoch);
    let slots: Vec<Slot> = (epoch_slots.start_slot.as_u64()..=epoch_slots.end_slot.as_u64())
        .map(Slot::new)
        .collect();
    let candidate_ids = {
        let mut conn = ctx.store.conn()?;
        indexer_store::committees::validator_ids_in_slots(&mut conn, &slots)?
    };
    let eligible_ids = if candidate_ids.is_empty() {
        Vec::new()
    } else {
        let mut conn = ctx.store.conn()?;
        indexer_store::validators::reward_eligible_validator_ids(&mut conn, &candidate_ids)?
    };

    let response = ctx.beacon_api.get_attestation_rewards(epoch, &eligible_ids).await?;
    let datetime_hour = ctx.beacon_time.utc_hour_for_epoch_start(epoch);

    let mut conn = ctx.store.conn()?;
    indexer_store::attestation_rewards::persist_attestation_rewards(
        &mut conn,
        epoch,
        datetime_hour,
        &response.data.total_rewards,
        &response.data.ideal_rewards,
    )?;
    Ok(())
}

/// Decodes one SSZ bitlist: a hex-encoded byte string whose final set bit is
/// a length sentinel, not a data bit (standard `List[bool, N]` SSZ
/// encoding). Returns the indices of every set data bit.
pub fn decode_aggregation_bits(encoded: &str) -> Vec<u32> {
    let Ok(bytes) = hex::decode(encoded.trim_start_matches("0x")) else {
        return Vec::new();
    };
    let total_bits = bytes.len() * 8;
    let highest_set = (0..total_bits)
        .rev()
        .find(|&bit| bit_at(&bytes, bit))
        .unwrap_or(0);

    (0..highest_set)
        .filter(|&bit| bit_at(&bytes, bit))
        .map(|bit| bit as u32)
        .collect()
}

fn bit_at(bytes: &[u8], bit: usize) -> bool {
    let byte = bytes[bit / 8];
    (byte >> (bit % 8)) & 1 == 1
}

/// One observed attestation inclusion: the attested slot/committee/bit and
/// the inclusion delay (the including block's slot minus the attested
/// slot), per spec §4.4 "Attestation delays".
pub struct ObservedDelay {
    pub attested_slot: Slot,
    pub committee_index: u32,
    pub bit: u32,
    pub delay: u32,
}

/// Decodes every attestation in a block into `(attested_slot, committee,
/// validator_bit, delay)` observations, given the per-slot committee sizes
/// already fetched from storage. Attestations referencing a committee index
/// past the slot's known committee count, or a bit past that committee's
/// size, are silently skipped (spec §4.4: `provided b < count[cIdx]`).
pub fn decode_attestations(
    including_slot: Slot,
    attestations: &[indexer_types::AttestationJson],
    committee_sizes: &std::collections::BTreeMap<u64, Vec<u32>>,
) -> Vec<ObservedDelay> {
    let mut observed = Vec::new();
    for attestation in attestations {
        let attested_slot = attestation.data.slot;
        let committee_index = attestation.data.index as u32;
        let Some(counts) = committee_sizes.get(&attested_slot) else {
            continue;
        };
        for bit in decode_aggregation_bits(&attestation.aggregation_bits) {
            if committee::decode_validator_index(counts, committee_index, bit).is_none() {
                continue;
            }
            observed.push(ObservedDelay {
                attested_slot: Slot::new(attested_slot),
                committee_index,
                bit,
                delay: including_slot.as_u64().saturating_sub(attested_slot) as u32,
            });
        }
    }
    observed
}

/// Deduplicates observed delays by `(slot, committee, bit)`, keeping the
/// minimum delay within the batch, in the shape
/// `update_attestation_delays` expects.
pub fn dedupe_keep_minimum(observed: Vec<ObservedDelay>) -> Vec<(Slot, u32, u32, u32)> {
    use std::collections::HashMap;
    let mut best: HashMap<(u64, u32, u32), u32> = HashMap::new();
    for o in &observed {
        best.entry((o.attested_slot.as_u64(), o.committee_index, o.bit))
            .and_modify(|d| *d = (*d).min(o.delay))
            .or_insert(o.delay);
    }
    best.into_iter()
        .map(|((slot, committee_index, bit), delay)| (Slot::new(slot), committee_index, bit, delay))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_bitlist_ignoring_length_sentinel() {
        // 0b0000_1011 with the high bit (3) as the length sentinel: data
        // bits 0 and 1 are set, bit 2 is not, bit 3 terminates the list.
        let bits = decode_aggregation_bits("0x0b");
        assert_eq!(bits, vec![0, 1]);
    }

    #[test]
    fn empty_bitlist_is_just_the_sentinel() {
        let bits = decode_aggregation_bits("0x01");
        assert!(bits.is_empty());
    }

    #[test]
    fn dedupe_keeps_the_minimum_delay_per_key() {
        let observed = vec![
            ObservedDelay { attested_slot: Slot::new(10), committee_index: 0, bit: 2, delay: 3 },
            ObservedDelay { attested_slot: Slot::new(10), committee_index: 0, bit: 2, delay: 1 },
            ObservedDelay { attested_slot: Slot::new(10), committee_index: 0, bit: 2, delay: 2 },
        ];
        let deduped = dedupe_keep_minimum(observed);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].3, 1);
    }
}
