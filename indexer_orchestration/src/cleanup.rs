use crate::context::Context;
use slog::{info, warn};

/// Periodic maintenance task: prunes `Committee` rows that are both old
/// enough and already below the cleanup threshold (spec §4.4 "Cleanup").
/// Runs once per epoch-duration tick; not gated on any epoch's flags since
/// it's pure maintenance, not a correctness-bearing step.
pub async fn run(ctx: Context) {
    let tick = ctx.config.slot_duration() * ctx.config.chain.slots_per_epoch as u32;
    loop {
        match tick_once(&ctx) {
            Ok(deleted) if deleted > 0 => {
                info!(ctx.log, "cleaned up old committees"; "deleted" => deleted);
            }
            Ok(_) => {}
            Err(e) => warn!(ctx.log, "committee cleanup failed"; "error" => ?e),
        }
        tokio::select! {
            _ = tokio::time::sleep(tick) => {}
            _ = ctx.executor.exit().wait() => return,
        }
    }
}

fn tick_once(ctx: &Context) -> Result<usize, crate::error::Error> {
    let mut conn = ctx.store.conn()?;
    let current_slot = ctx.current_slot();
    Ok(indexer_store::committees::cleanup_old_committees(
        &mut conn,
        current_slot,
        ctx.config.chain.slots_per_epoch,
        ctx.config.max_attestation_delay,
    )?)
}
