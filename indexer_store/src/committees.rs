use crate::error::Error;
use crate::schema::committees::dsl as committees_dsl;
use crate::schema::epochs::dsl as epochs_dsl;
use crate::schema::slots::dsl as slots_dsl;
use beacon_time::{Epoch, Slot};
use diesel::prelude::*;
use diesel::upsert::excluded;
use indexer_types::Committee;
use std::collections::BTreeMap;

/// `saveCommitteesData`: upserts one `Slot` row per slot with its
/// committee-size array, bulk-inserts every `Committee` row, and sets
/// `epoch.committeesFetched = true` — all in one transaction (spec §4.4
/// "Committees").
pub fn save_committees_data(
    conn: &mut PgConnection,
    epoch: Epoch,
    committees_count_in_slot: &BTreeMap<u64, Vec<u32>>,
    committees: &[Committee],
) -> Result<(), Error> {
    conn.transaction(|conn| {
        let already_fetched: bool = epochs_dsl::epochs
            .find(epoch.as_u64() as i64)
            .select(epochs_dsl::committees_fetched)
            .first(conn)?;
        if already_fetched {
            return Err(Error::AlreadyFetched("committees"));
        }

        for (&slot, counts) in committees_count_in_slot {
            let counts_i32: Vec<i32> = counts.iter().map(|&c| c as i32).collect();
            diesel::insert_into(slots_dsl::slots)
                .values((
                    slots_dsl::slot.eq(slot as i64),
                    slots_dsl::committees_count_in_slot.eq(Some(counts_i32.clone())),
                ))
                .on_conflict(slots_dsl::slot)
                .do_update()
                .set(slots_dsl::committees_count_in_slot.eq(Some(counts_i32)))
                .execute(conn)?;
        }

        for chunk in committees.chunks(2000) {
            let rows: Vec<_> = chunk
                .iter()
                .map(|c| {
                    (
                        committees_dsl::slot.eq(c.key.slot.as_u64() as i64),
                        committees_dsl::committee_index.eq(c.key.committee_index as i32),
                        committees_dsl::aggregation_bits_index.eq(c.key.aggregation_bits_index as i32),
                        committees_dsl::validator_index.eq(c.validator_index as i64),
                    )
                })
                .collect();
            diesel::insert_into(committees_dsl::committees)
                .values(&rows)
                .on_conflict((
                    committees_dsl::slot,
                    committees_dsl::committee_index,
                    committees_dsl::aggregation_bits_index,
                ))
                .do_update()
                .set(committees_dsl::validator_index.eq(excluded(committees_dsl::validator_index)))
                .execute(conn)?;
        }

        diesel::update(epochs_dsl::epochs.find(epoch.as_u64() as i64))
            .set(epochs_dsl::committees_fetched.eq(true))
            .execute(conn)?;
        Ok(())
    })
}

/// `getCommitteeSizesForSlots`: the `committeesCountInSlot` array for each
/// requested slot, `None` when not yet persisted.
pub fn get_committee_sizes_for_slots(
    conn: &mut PgConnection,
    slots: &[Slot],
) -> Result<BTreeMap<u64, Vec<u32>>, Error> {
    let slot_list: Vec<i64> = slots.iter().map(|s| s.as_u64() as i64).collect();
    let rows: Vec<(i64, Option<Vec<i32>>)> = slots_dsl::slots
        .filter(slots_dsl::slot.eq_any(&slot_list))
        .select((slots_dsl::slot, slots_dsl::committees_count_in_slot))
        .load(conn)?;
    Ok(rows
        .into_iter()
        .filter_map(|(slot, counts)| counts.map(|c| (slot as u64, c.into_iter().map(|v| v as u32).collect())))
        .collect())
}

/// Batch-updates `Committee.attestationDelay`, keeping the minimum observed
/// value (spec §4.4 "Attestation delays" / §8 property 4). `observed` is
/// already deduplicated by `(slot, committeeIndex, aggregationBitsIndex)`
/// keeping the smallest delay within the batch.
pub fn update_attestation_delays(
    conn: &mut PgConnection,
    observed: &[(beacon_time::Slot, u32, u32, u32)],
) -> Result<(), Error> {
    conn.transaction(|conn| {
        for &(slot, committee_index, bit, delay) in observed {
            diesel::update(
                committees_dsl::committees
                    .filter(committees_dsl::slot.eq(slot.as_u64() as i64))
                    .filter(committees_dsl::committee_index.eq(committee_index as i32))
                    .filter(committees_dsl::aggregation_bits_index.eq(bit as i32))
                    .filter(
                        committees_dsl::attestation_delay
                            .is_null()
                            .or(committees_dsl::attestation_delay.gt(delay as i32)),
                    ),
            )
            .set(committees_dsl::attestation_delay.eq(delay as i32))
            .execute(conn)?;
        }
        Ok(())
    })
}

/// Distinct validator ids assigned to a committee in any of the given
/// slots — the universe of validators actually active in an epoch,
/// independent of whether they already have a `validators` row. Used to
/// seed the attestation-rewards candidate set (spec §4.4 "Attestation
/// rewards": unknown-null validators are still eligible).
pub fn validator_ids_in_slots(conn: &mut PgConnection, slots: &[Slot]) -> Result<Vec<u64>, Error> {
    let slot_list: Vec<i64> = slots.iter().map(|s| s.as_u64() as i64).collect();
    let ids: Vec<i64> = committees_dsl::committees
        .filter(committees_dsl::slot.eq_any(&slot_list))
        .select(committees_dsl::validator_index)
        .distinct()
        .load(conn)?;
    Ok(ids.into_iter().map(|i| i as u64).collect())
}

/// Cleanup: deletes `Committee` rows older than `3 * slots_per_epoch` slots
/// whose `attestationDelay` is non-null and `<= max_attestation_delay`. A
/// row that never got an observed attestation (`attestationDelay IS NULL`)
/// is preserved regardless of age (§9 open question 2, resolved in
/// DESIGN.md).
pub fn cleanup_old_committees(
    conn: &mut PgConnection,
    current_slot: Slot,
    slots_per_epoch: u64,
    max_attestation_delay: u32,
) -> Result<usize, Error> {
    let cutoff = current_slot.as_u64().saturating_sub(3 * slots_per_epoch) as i64;
    let deleted = diesel::delete(
        committees_dsl::committees
            .filter(committees_dsl::slot.lt(cutoff))
            .filter(committees_dsl::attestation_delay.is_not_null())
            .filter(committees_dsl::attestation_delay.le(max_attestation_delay as i32)),
    )
    .execute(conn)?;
    Ok(deleted)
}
