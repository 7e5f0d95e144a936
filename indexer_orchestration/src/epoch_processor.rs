use crate::context::Context;
use crate::slot_orchestrator;
use beacon_time::Epoch;
use indexer_types::EpochRecord;
use slog::{info, warn};
use std::time::Duration;
use tokio::sync::watch;

/// Repeats `action` until it succeeds, logging each failure. Mirrors the
/// "onError: self" retransition in spec §4.5.3 — a region never gives up,
/// it just keeps retrying at the HTTP layer's own cadence.
async fn retry_forever<T, F, Fut>(log: &slog::Logger, name: &'static str, mut action: F) -> T
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, crate::error::Error>>,
{
    loop {
        match action().await {
            Ok(value) => return value,
            Err(e) => {
                warn!(log, "region action failed, retrying"; "region" => name, "error" => ?e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

/// Polls `predicate` every `interval` until it's true.
async fn wait_until(interval: Duration, mut predicate: impl FnMut() -> bool) {
    while !predicate() {
        tokio::time::sleep(interval).await;
    }
}

/// Runs one epoch end to end: the entry gate plus the six (seven, counting
/// `rewards` separately from `validatorsBalances`) parallel regions of
/// spec §4.5.3. Returns once every region has reached its terminal state
/// and the epoch has been marked processed.
pub async fn run(ctx: Context, record: EpochRecord) {
    let epoch = record.epoch;
    let slots = ctx.beacon_time.epoch_slots(epoch);
    let half_slot = ctx.config.slot_duration() / 2;

    // Gate: may proceed only if epoch <= currentEpoch + 1.
    wait_until(half_slot, || {
        let current_epoch = ctx.beacon_time.epoch_from_slot(ctx.current_slot());
        epoch.as_u64() <= current_epoch.as_u64() + 1
    })
    .await;

    let (epoch_started_tx, epoch_started_rx) = watch::channel(false);
    let (committees_tx, committees_rx) = watch::channel(record.flags.committees_fetched);
    let (balances_tx, balances_rx) = watch::channel(record.flags.validators_balances_fetched);

    tokio::join!(
        monitoring_epoch_start(&ctx, slots.start_slot, half_slot, epoch_started_tx),
        committees(&ctx, epoch, record.flags.committees_fetched, committees_tx),
        sync_committees(&ctx, epoch, record.flags.sync_committees_fetched),
        slots_processing(
            &ctx,
            epoch,
            record.flags.slots_fetched,
            committees_rx.clone(),
            epoch_started_rx.clone()
        ),
        tracking_validators_activation(&ctx, epoch, record.flags.validators_activation_fetched, epoch_started_rx.clone()),
        validators_balances(&ctx, epoch, record.flags.validators_balances_fetched, epoch_started_rx.clone(), balances_tx),
        rewards(&ctx, epoch, record.flags.rewards_fetched, balances_rx, slots.end_slot, half_slot),
    );

    if let Ok(mut conn) = ctx.store.conn() {
        let _ = indexer_store::epochs::mark_epoch_as_processed(&mut conn, epoch);
    }
    info!(ctx.log, "epoch completed"; "epoch" => epoch.as_u64());
}

async fn monitoring_epoch_start(
    ctx: &Context,
    start_slot: beacon_time::Slot,
    half_slot: Duration,
    tx: watch::Sender<bool>,
) {
    wait_until(half_slot, || ctx.current_slot().as_u64() >= start_slot.as_u64()).await;
    let _ = tx.send(true);
}

async fn committees(ctx: &Context, epoch: Epoch, already_fetched: bool, tx: watch::Sender<bool>) {
    if !already_fetched {
        retry_forever(&ctx.log, "committees", || async {
            crate::controllers::fetch_and_save_committees(ctx, epoch).await
        })
        .await;
    }
    let _ = tx.send(true);
}

async fn sync_committees(ctx: &Context, epoch: Epoch, already_fetched: bool) {
    if already_fetched {
        return;
    }
    retry_forever(&ctx.log, "syncCommittees", || async {
        crate::controllers::fetch_and_save_sync_committee(ctx, epoch).await
    })
    .await;
}

async fn slots_processing(
    ctx: &Context,
    epoch: Epoch,
    already_fetched: bool,
    mut committees_rx: watch::Receiver<bool>,
    mut epoch_started_rx: watch::Receiver<bool>,
) {
    if already_fetched {
        return;
    }
    let _ = committees_rx.wait_for(|v| *v).await;
    let _ = epoch_started_rx.wait_for(|v| *v).await;

    slot_orchestrator::run(ctx.clone(), epoch).await;

    if let Ok(mut conn) = ctx.store.conn() {
        let _ = indexer_store::epochs::set_slots_fetched(&mut conn, epoch);
    }
}

async fn tracking_validators_activation(
    ctx: &Context,
    epoch: Epoch,
    already_fetched: bool,
    mut epoch_started_rx: watch::Receiver<bool>,
) {
    if already_fetched {
        return;
    }
    let _ = epoch_started_rx.wait_for(|v| *v).await;
    retry_forever(&ctx.log, "trackingValidatorsActivation", || async {
        crate::controllers::update_validator_statuses(ctx, epoch).await
    })
    .await;
    if let Ok(mut conn) = ctx.store.conn() {
        let _ = indexer_store::epochs::set_validators_activation_fetched(&mut conn, epoch);
    }
}

async fn validators_balances(
    ctx: &Context,
    epoch: Epoch,
    already_fetched: bool,
    mut epoch_started_rx: watch::Receiver<bool>,
    tx: watch::Sender<bool>,
) {
    if !already_fetched {
        let _ = epoch_started_rx.wait_for(|v| *v).await;
        retry_forever(&ctx.log, "validatorsBalances", || async {
            crate::controllers::fetch_and_save_validator_balances(ctx, epoch).await
        })
        .await;
    }
    let _ = tx.send(true);
}

async fn rewards(
    ctx: &Context,
    epoch: Epoch,
    already_fetched: bool,
    mut balances_rx: watch::Receiver<bool>,
    end_slot: beacon_time::Slot,
    half_slot: Duration,
) {
    if already_fetched {
        return;
    }
    let _ = balances_rx.wait_for(|v| *v).await;
    wait_until(half_slot, || ctx.current_slot().as_u64() > end_slot.as_u64()).await;
    retry_forever(&ctx.log, "rewards", || async {
        crate::controllers::fetch_and_save_attestation_rewards(ctx, epoch).await
    })
    .await;
}
