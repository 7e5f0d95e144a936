use crate::context::Context;
use crate::controllers;
use beacon_time::Slot;
use diesel::prelude::*;
use indexer_store::slots::SlotBlockFields;
use indexer_types::{block, MaybeMissed};
use slog::warn;
use std::time::Duration;

/// Runs one slot end to end: the five sequential gates of spec §4.5.5
/// followed by the `processingSlot` parallel regions, then
/// `markingSlotCompleted`. Never returns early on a transient error — every
/// region retries its own action indefinitely, matching the "onError:
/// self" rule used throughout the orchestration tree.
pub async fn run(ctx: &Context, slot: Slot) {
    let record = loop {
        match indexer_store_conn_op(ctx, |conn| indexer_store::slots::get_or_create_slot(conn, slot)) {
            Ok(r) => break r,
            Err(e) => {
                warn!(ctx.log, "gettingSlot failed, retrying"; "slot" => slot.as_u64(), "error" => ?e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    };

    if record.flags.processed {
        return;
    }

    let third_slot = ctx.config.slot_duration() / 3;
    loop {
        let ready_at = slot.as_u64() + ctx.config.delay_slots_to_head;
        if ctx.current_slot().as_u64() >= ready_at {
            break;
        }
        tokio::time::sleep(third_slot).await;
    }

    let block = loop {
        match ctx.beacon_api.get_block(slot).await {
            Ok(b) => break b,
            Err(e) => {
                warn!(ctx.log, "fetchingBeaconBlock failed, retrying"; "slot" => slot.as_u64(), "error" => ?e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    };

    let envelope = match block {
        MaybeMissed::Missed => {
            mark_completed(ctx, slot).await;
            return;
        }
        MaybeMissed::Present(envelope) => envelope,
    };

    tokio::join!(
        attestations_region(ctx, slot, record.flags.attestations_fetched),
        block_body_region(ctx, slot, record.flags.beacon_block_processed, &envelope),
        execution_rewards_region(ctx, slot, record.flags.execution_rewards_fetched, &envelope),
        block_and_sync_rewards_region(
            ctx,
            slot,
            record.flags.block_rewards_fetched,
            record.flags.sync_rewards_fetched,
            envelope.message.proposer_index,
        ),
    );

    mark_completed(ctx, slot).await;
}

async fn mark_completed(ctx: &Context, slot: Slot) {
    loop {
        if indexer_store_conn_op(ctx, |conn| indexer_store::slots::mark_slot_processed(conn, slot)).is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

fn indexer_store_conn_op<T>(
    ctx: &Context,
    op: impl FnOnce(&mut indexer_store::PgConnection) -> Result<T, indexer_store::Error>,
) -> Result<T, indexer_store::Error> {
    let mut conn = ctx.store.conn()?;
    op(&mut conn)
}

/// `beaconBlock/attestations`: the delay-attribution algorithm of spec
/// §4.4, skipped entirely at the lookback boundary.
async fn attestations_region(ctx: &Context, slot: Slot, already_fetched: bool) {
    if already_fetched {
        return;
    }
    if slot.as_u64() == ctx.config.lookback_slot.as_u64() {
        let _ = indexer_store_conn_op(ctx, |conn| indexer_store::slots::set_attestations_fetched(conn, slot));
        return;
    }

    loop {
        match attestations_once(ctx, slot).await {
            Ok(()) => return,
            Err(e) => {
                warn!(ctx.log, "attestations region failed, retrying"; "slot" => slot.as_u64(), "error" => ?e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

async fn attestations_once(ctx: &Context, slot: Slot) -> Result<(), crate::error::Error> {
    let attestations = ctx.beacon_api.get_block_attestations(slot).await?;

    let attested_slots: std::collections::BTreeSet<u64> = attestations
        .iter()
        .map(|a| a.data.slot)
        .filter(|&s| s >= ctx.config.lookback_slot.as_u64())
        .collect();
    let slot_list: Vec<Slot> = attested_slots.iter().map(|&s| Slot::new(s)).collect();

    let committee_sizes = loop {
        let sizes = {
            let mut conn = ctx.store.conn()?;
            indexer_store::committees::get_committee_sizes_for_slots(&mut conn, &slot_list)?
        };
        if slot_list.iter().all(|s| sizes.contains_key(&s.as_u64())) {
            break sizes;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    };

    let observed = controllers::decode_attestations(slot, &attestations, &committee_sizes);
    let deduped = controllers::dedupe_keep_minimum(observed);

    let mut conn = ctx.store.conn()?;
    indexer_store::committees::update_attestation_delays(&mut conn, &deduped)?;
    indexer_store::slots::set_attestations_fetched(&mut conn, slot)?;
    Ok(())
}

/// `beaconBlock/withdrawalRewards, clDeposits, clVoluntaryExits,
/// elDeposits, elWithdrawals, elConsolidations`: formats each array and
/// stores it on the slot row.
async fn block_body_region(ctx: &Context, slot: Slot, already_processed: bool, envelope: &indexer_types::BeaconBlockJson) {
    if already_processed {
        return;
    }
    let body = &envelope.body;
    let fields = SlotBlockFields {
        withdrawals: body
            .execution_payload
            .as_ref()
            .map(|p| block::format_withdrawals(&p.withdrawals)),
        cl_deposits: Some(block::format_deposits(&body.deposits)),
        cl_voluntary_exits: Some(block::format_voluntary_exits(&body.voluntary_exits)),
        el_deposits: body
            .execution_payload
            .as_ref()
            .map(|p| block::format_el_deposits(&p.deposit_requests)),
        el_withdrawals: body
            .execution_payload
            .as_ref()
            .map(|p| block::format_el_withdrawals(&p.withdrawal_requests)),
        el_consolidations: body
            .execution_payload
            .as_ref()
            .map(|p| block::format_el_consolidations(&p.consolidation_requests)),
    };

    loop {
        let result = indexer_store_conn_op(ctx, |conn| {
            conn.transaction(|conn| {
                indexer_store::slots::set_block_fields(conn, slot, fields.clone())?;
                indexer_store::slots::set_beacon_block_processed(conn, slot)
            })
        });
        if result.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

/// `executionRewards`: the fee recipient's balance delta across the block.
async fn execution_rewards_region(
    ctx: &Context,
    slot: Slot,
    already_fetched: bool,
    envelope: &indexer_types::BeaconBlockJson,
) {
    if already_fetched {
        return;
    }
    let Some(payload) = &envelope.body.execution_payload else {
        return;
    };
    loop {
        match execution_rewards_once(ctx, slot, payload).await {
            Ok(()) => return,
            Err(e) => {
                warn!(ctx.log, "executionRewards region failed, retrying"; "slot" => slot.as_u64(), "error" => ?e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

async fn execution_rewards_once(
    ctx: &Context,
    slot: Slot,
    payload: &indexer_types::ExecutionPayloadJson,
) -> Result<(), crate::error::Error> {
    let (address, amount) = ctx.execution.block_execution_reward(payload.block_number).await?;
    let timestamp = chrono::DateTime::from_timestamp(payload.timestamp as i64, 0).unwrap_or_else(chrono::Utc::now);

    let mut conn = ctx.store.conn()?;
    indexer_store::execution_rewards::persist_execution_reward(
        &mut conn,
        slot,
        payload.block_number,
        &address,
        timestamp,
        amount,
    )?;
    Ok(())
}

/// `blockAndSyncRewards`: waits for the enclosing epoch's sync committee to
/// exist, then persists proposer and sync-committee rewards independently
/// (either may already be done).
async fn block_and_sync_rewards_region(
    ctx: &Context,
    slot: Slot,
    block_rewards_fetched: bool,
    sync_rewards_fetched: bool,
    proposer_index: u64,
) {
    if block_rewards_fetched && sync_rewards_fetched {
        return;
    }

    let epoch = ctx.beacon_time.epoch_from_slot(slot);
    let sync_committee = loop {
        match indexer_store_conn_op(ctx, |conn| indexer_store::sync_committees::get_sync_committee_for_epoch(conn, epoch)) {
            Ok(Some(committee)) => break committee,
            Ok(None) => tokio::time::sleep(Duration::from_secs(1)).await,
            Err(e) => {
                warn!(ctx.log, "waiting for sync committee failed, retrying"; "slot" => slot.as_u64(), "error" => ?e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    };

    let datetime_hour = ctx.beacon_time.utc_hour(ctx.beacon_time.timestamp_from_slot(slot));

    if !block_rewards_fetched {
        loop {
            match block_rewards_once(ctx, slot, proposer_index, datetime_hour).await {
                Ok(()) => break,
                Err(e) => {
                    warn!(ctx.log, "block rewards failed, retrying"; "slot" => slot.as_u64(), "error" => ?e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    if !sync_rewards_fetched {
        loop {
            match sync_rewards_once(ctx, slot, &sync_committee.validators, datetime_hour).await {
                Ok(()) => break,
                Err(e) => {
                    warn!(ctx.log, "sync rewards failed, retrying"; "slot" => slot.as_u64(), "error" => ?e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }
}

async fn block_rewards_once(
    ctx: &Context,
    slot: Slot,
    proposer_index: u64,
    datetime_hour: chrono::DateTime<chrono::Utc>,
) -> Result<(), crate::error::Error> {
    let current_slot = ctx.current_slot();
    let rewards = ctx.beacon_api.get_block_rewards(slot, current_slot).await?;
    let mut conn = ctx.store.conn()?;
    match rewards {
        MaybeMissed::Present(data) => {
            indexer_store::slot_rewards::persist_block_rewards(&mut conn, slot, proposer_index, datetime_hour, data.total)?;
        }
        MaybeMissed::Missed => {
            indexer_store::slots::mark_block_rewards_fetched(&mut conn, slot)?;
        }
    }
    Ok(())
}

async fn sync_rewards_once(
    ctx: &Context,
    slot: Slot,
    validator_ids: &[u64],
    datetime_hour: chrono::DateTime<chrono::Utc>,
) -> Result<(), crate::error::Error> {
    if validator_ids.is_empty() {
        let mut conn = ctx.store.conn()?;
        indexer_store::slots::mark_sync_rewards_fetched(&mut conn, slot)?;
        return Ok(());
    }
    let rewards = ctx.beacon_api.get_sync_committee_rewards(slot, validator_ids).await?;
    let mut conn = ctx.store.conn()?;
    match rewards {
        MaybeMissed::Present(entries) if !entries.is_empty() => {
            indexer_store::slot_rewards::persist_sync_rewards(&mut conn, slot, datetime_hour, &entries)?;
        }
        _ => {
            indexer_store::slots::mark_sync_rewards_fetched(&mut conn, slot)?;
        }
    }
    Ok(())
}
