use crate::context::Context;
use crate::epoch_processor;
use slog::info;

/// Drives one epoch processor at a time, always working the oldest
/// unprocessed epoch (spec §4.5.2). "Spawn" / "stop the child" collapses to
/// a plain `.await`: only one processor is ever live, so there is nothing
/// to cancel on a normal `EPOCH_COMPLETED` — the call simply returns.
pub async fn run(ctx: Context) {
    loop {
        let epoch = {
            let mut conn = match ctx.store.conn() {
                Ok(c) => c,
                Err(_) => {
                    tokio::time::sleep(ctx.config.slot_duration()).await;
                    continue;
                }
            };
            indexer_store::epochs::min_epoch_to_process(&mut conn).ok().flatten()
        };

        let Some(record) = epoch else {
            tokio::select! {
                _ = tokio::time::sleep(ctx.config.slot_duration()) => continue,
                _ = ctx.executor.exit().wait() => return,
            }
        };

        info!(ctx.log, "starting epoch processor"; "epoch" => record.epoch.as_u64());
        tokio::select! {
            _ = epoch_processor::run(ctx.clone(), record) => {}
            _ = ctx.executor.exit().wait() => return,
        }
    }
}
