use crate::error::Error;
use crate::models::SlotRow;
use crate::schema::slots::dsl;
use beacon_time::Slot;
use diesel::prelude::*;
use indexer_types::{SlotFlags, SlotRecord};

fn row_to_record(row: SlotRow) -> SlotRecord {
    SlotRecord {
        slot: Slot::new(row.slot as u64),
        flags: SlotFlags {
            processed: row.processed,
            attestations_fetched: row.attestations_fetched,
            sync_rewards_fetched: row.sync_rewards_fetched,
            block_rewards_fetched: row.block_rewards_fetched,
            execution_rewards_fetched: row.execution_rewards_fetched,
            beacon_block_processed: row.beacon_block_processed,
        },
        proposer_index: row.proposer_index.map(|v| v as u64),
        consensus_reward: row.consensus_reward.map(|v| v as u128),
        committees_count_in_slot: row
            .committees_count_in_slot
            .map(|v| v.into_iter().map(|c| c as u32).collect()),
        withdrawals: row.withdrawals,
        cl_deposits: row.cl_deposits,
        cl_voluntary_exits: row.cl_voluntary_exits,
        el_deposits: row.el_deposits,
        el_withdrawals: row.el_withdrawals,
        el_consolidations: row.el_consolidations,
    }
}

/// `gettingSlot`: reads the slot row, creating it (all flags false) if this
/// is the first time it's touched.
pub fn get_or_create_slot(conn: &mut PgConnection, slot: Slot) -> Result<SlotRecord, Error> {
    diesel::insert_into(dsl::slots)
        .values(dsl::slot.eq(slot.as_u64() as i64))
        .on_conflict(dsl::slot)
        .do_nothing()
        .execute(conn)?;
    let row: SlotRow = dsl::slots.find(slot.as_u64() as i64).first(conn)?;
    Ok(row_to_record(row))
}

pub fn get_slot(conn: &mut PgConnection, slot: Slot) -> Result<Option<SlotRecord>, Error> {
    let row: Option<SlotRow> = dsl::slots.find(slot.as_u64() as i64).first(conn).optional()?;
    Ok(row.map(row_to_record))
}

pub fn mark_slot_processed(conn: &mut PgConnection, slot: Slot) -> Result<(), Error> {
    diesel::update(dsl::slots.find(slot.as_u64() as i64))
        .set(dsl::processed.eq(true))
        .execute(conn)?;
    Ok(())
}

pub fn set_attestations_fetched(conn: &mut PgConnection, slot: Slot) -> Result<(), Error> {
    diesel::update(dsl::slots.find(slot.as_u64() as i64))
        .set(dsl::attestations_fetched.eq(true))
        .execute(conn)?;
    Ok(())
}

pub fn set_execution_rewards_fetched(conn: &mut PgConnection, slot: Slot) -> Result<(), Error> {
    diesel::update(dsl::slots.find(slot.as_u64() as i64))
        .set(dsl::execution_rewards_fetched.eq(true))
        .execute(conn)?;
    Ok(())
}

pub fn set_beacon_block_processed(conn: &mut PgConnection, slot: Slot) -> Result<(), Error> {
    diesel::update(dsl::slots.find(slot.as_u64() as i64))
        .set(dsl::beacon_block_processed.eq(true))
        .execute(conn)?;
    Ok(())
}

/// Marks `blockRewardsFetched = true` with no reward row changes — the
/// missed-slot outcome of spec §8 scenario S5 ("404 -> blockRewardsFetched
/// = true, no changes to HourlyValidatorStats").
pub fn mark_block_rewards_fetched(conn: &mut PgConnection, slot: Slot) -> Result<(), Error> {
    diesel::update(dsl::slots.find(slot.as_u64() as i64))
        .set(dsl::block_rewards_fetched.eq(true))
        .execute(conn)?;
    Ok(())
}

/// Marks `syncRewardsFetched = true` with no reward row changes — the
/// missed-slot counterpart to `mark_block_rewards_fetched`.
pub fn mark_sync_rewards_fetched(conn: &mut PgConnection, slot: Slot) -> Result<(), Error> {
    diesel::update(dsl::slots.find(slot.as_u64() as i64))
        .set(dsl::sync_rewards_fetched.eq(true))
        .execute(conn)?;
    Ok(())
}

/// The six `"index:amount"`-formatted block-derived fields (spec §4.5.5
/// "processingSlot"). Each is independent of the others; pass `None` to
/// leave a field untouched.
#[derive(Debug, Clone, Default)]
pub struct SlotBlockFields {
    pub withdrawals: Option<String>,
    pub cl_deposits: Option<String>,
    pub cl_voluntary_exits: Option<String>,
    pub el_deposits: Option<String>,
    pub el_withdrawals: Option<String>,
    pub el_consolidations: Option<String>,
}

pub fn set_block_fields(conn: &mut PgConnection, slot: Slot, fields: SlotBlockFields) -> Result<(), Error> {
    diesel::update(dsl::slots.find(slot.as_u64() as i64))
        .set((
            dsl::withdrawals.eq(fields.withdrawals),
            dsl::cl_deposits.eq(fields.cl_deposits),
            dsl::cl_voluntary_exits.eq(fields.cl_voluntary_exits),
            dsl::el_deposits.eq(fields.el_deposits),
            dsl::el_withdrawals.eq(fields.el_withdrawals),
            dsl::el_consolidations.eq(fields.el_consolidations),
        ))
        .execute(conn)?;
    Ok(())
}
