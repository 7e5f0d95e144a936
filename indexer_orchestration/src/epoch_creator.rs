use crate::context::Context;
use beacon_time::Epoch;
use slog::{error, info};
use std::time::Duration;

/// Periodic task that keeps the unprocessed-epoch window full (spec
/// §4.5.1). Runs until shutdown; a failed tick is logged and retried on the
/// next tick rather than escalated.
pub async fn run(ctx: Context) {
    loop {
        if let Err(e) = tick(&ctx) {
            error!(ctx.log, "epoch creator tick failed"; "error" => ?e);
            tokio::time::sleep(ctx.config.slot_duration()).await;
            continue;
        }
        tokio::select! {
            _ = tokio::time::sleep(ctx.config.slot_duration()) => {}
            _ = ctx.executor.exit().wait() => return,
        }
    }
}

fn tick(ctx: &Context) -> Result<(), crate::error::Error> {
    let mut conn = ctx.store.conn()?;
    let unprocessed = indexer_store::epochs::unprocessed_count(&mut conn)?;
    let max_in_db = indexer_store::epochs::max_epoch_in_db(&mut conn)?;

    let target = ctx.config.max_unprocessed_epochs;
    let needed = target.saturating_sub(unprocessed);
    if needed == 0 {
        return Ok(());
    }

    let fallback_start = Epoch::new(ctx.config.lookback_slot.as_u64() / ctx.config.chain.slots_per_epoch);
    let start = max_in_db.map(|e| e.as_u64() + 1).unwrap_or(fallback_start.as_u64());
    let requested: Vec<Epoch> = (start..start + needed).map(Epoch::new).collect();

    indexer_store::epochs::create_epochs(&mut conn, &requested, fallback_start)?;
    info!(ctx.log, "created epochs"; "start" => start, "count" => needed);
    Ok(())
}
