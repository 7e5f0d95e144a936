use crate::context::Context;
use crate::slot_processor;
use beacon_time::Epoch;

/// Drives every slot in an epoch strictly sequentially (spec §4.5.4): the
/// next slot is not started until the previous one's processor has
/// returned.
pub async fn run(ctx: Context, epoch: Epoch) {
    let epoch_slots = ctx.beacon_time.epoch_slots(epoch);
    let start_slot = epoch_slots.start_slot.as_u64().max(ctx.config.lookback_slot.as_u64());
    let end_slot = epoch_slots.end_slot.as_u64();

    for slot in start_slot..=end_slot {
        slot_processor::run(&ctx, beacon_time::Slot::new(slot)).await;
    }
}
