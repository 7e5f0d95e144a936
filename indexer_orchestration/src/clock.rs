use beacon_time::{BeaconTime, Epoch, Slot};
use chrono::Utc;
use indexer_http::PoolKind;

/// Wall-clock-derived "what slot is it right now", the one place the
/// orchestration tree reads the system clock.
pub fn current_slot(beacon_time: &BeaconTime) -> Slot {
    let now_ms = Utc::now().timestamp_millis().max(0) as u64;
    beacon_time.slot_from_timestamp(now_ms)
}

/// Picks `Archive` vs `Full` for an epoch-scoped call, per spec §4.2's
/// "indexer-delayed" promotion rule.
pub fn pool_kind_for_epoch(current_epoch: Epoch, target_epoch: Epoch) -> PoolKind {
    let delayed = indexer_http::is_indexer_delayed(current_epoch.as_u64(), target_epoch.as_u64());
    indexer_http::pool::resolve_pool_kind(PoolKind::Full, delayed)
}
