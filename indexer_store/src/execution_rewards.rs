use crate::error::Error;
use crate::schema::execution_rewards::dsl as rewards_dsl;
use crate::schema::slots::dsl as slots_dsl;
use beacon_time::Slot;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;

/// Persists one block's `ExecutionReward` and sets
/// `slot.executionRewardsFetched = true` (spec §4.5.5 "executionRewards").
pub fn persist_execution_reward(
    conn: &mut PgConnection,
    slot: Slot,
    block_number: u64,
    address: &str,
    timestamp: DateTime<Utc>,
    amount: u128,
) -> Result<(), Error> {
    conn.transaction(|conn| {
        diesel::insert_into(rewards_dsl::execution_rewards)
            .values((
                rewards_dsl::block_number.eq(block_number as i64),
                rewards_dsl::address.eq(address),
                rewards_dsl::timestamp.eq(timestamp),
                rewards_dsl::amount.eq(amount.to_string()),
            ))
            .on_conflict(rewards_dsl::block_number)
            .do_update()
            .set((
                rewards_dsl::address.eq(excluded(rewards_dsl::address)),
                rewards_dsl::amount.eq(excluded(rewards_dsl::amount)),
            ))
            .execute(conn)?;

        diesel::update(slots_dsl::slots.find(slot.as_u64() as i64))
            .set(slots_dsl::execution_rewards_fetched.eq(true))
            .execute(conn)?;
        Ok(())
    })
}
