use crate::error::Error;
use crate::schema::hourly_validator_stats::dsl as stats_dsl;
use crate::schema::slots::dsl as slots_dsl;
use crate::schema::sync_committee_rewards::dsl as rewards_dsl;
use beacon_time::Slot;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use indexer_types::SyncCommitteeRewardEntry;

/// Per-slot sync-committee rewards: upserts `SyncCommitteeRewards(slot,
/// validatorIndex)`, additively increments `HourlyValidatorStats.clRewards`
/// and `.syncCommittee` per validator, sets `slot.syncRewardsFetched =
/// true` — one transaction (spec §4.4 "Per-slot sync rewards", §8 property
/// 3 idempotence).
pub fn persist_sync_rewards(
    conn: &mut PgConnection,
    slot: Slot,
    datetime_hour: DateTime<Utc>,
    entries: &[SyncCommitteeRewardEntry],
) -> Result<(), Error> {
    conn.transaction(|conn| {
        for entry in entries {
            diesel::insert_into(rewards_dsl::sync_committee_rewards)
                .values((
                    rewards_dsl::slot.eq(slot.as_u64() as i64),
                    rewards_dsl::validator_index.eq(entry.validator_index as i64),
                    rewards_dsl::reward.eq(entry.reward),
                ))
                .on_conflict((rewards_dsl::slot, rewards_dsl::validator_index))
                .do_update()
                .set(rewards_dsl::reward.eq(excluded(rewards_dsl::reward)))
                .execute(conn)?;

            diesel::insert_into(stats_dsl::hourly_validator_stats)
                .values((
                    stats_dsl::datetime.eq(datetime_hour),
                    stats_dsl::validator_index.eq(entry.validator_index as i64),
                    stats_dsl::cl_rewards.eq(entry.reward),
                    stats_dsl::sync_committee.eq(1),
                ))
                .on_conflict((stats_dsl::datetime, stats_dsl::validator_index))
                .do_update()
                .set((
                    stats_dsl::cl_rewards.eq(stats_dsl::cl_rewards + excluded(stats_dsl::cl_rewards)),
                    stats_dsl::sync_committee.eq(stats_dsl::sync_committee + excluded(stats_dsl::sync_committee)),
                ))
                .execute(conn)?;
        }

        diesel::update(slots_dsl::slots.find(slot.as_u64() as i64))
            .set(slots_dsl::sync_rewards_fetched.eq(true))
            .execute(conn)?;
        Ok(())
    })
}

/// Per-slot block (proposer) rewards: updates `Slot.{proposerIndex,
/// consensusReward, blockRewardsFetched = true}` and additively increments
/// the proposer's `HourlyValidatorStats.{clRewards, blockReward}` (spec
/// §4.4 "Per-slot block rewards").
pub fn persist_block_rewards(
    conn: &mut PgConnection,
    slot: Slot,
    proposer_index: u64,
    datetime_hour: DateTime<Utc>,
    reward: u64,
) -> Result<(), Error> {
    conn.transaction(|conn| {
        diesel::update(slots_dsl::slots.find(slot.as_u64() as i64))
            .set((
                slots_dsl::proposer_index.eq(proposer_index as i64),
                slots_dsl::consensus_reward.eq(reward as i64),
                slots_dsl::block_rewards_fetched.eq(true),
            ))
            .execute(conn)?;

        diesel::insert_into(stats_dsl::hourly_validator_stats)
            .values((
                stats_dsl::datetime.eq(datetime_hour),
                stats_dsl::validator_index.eq(proposer_index as i64),
                stats_dsl::cl_rewards.eq(reward as i64),
                stats_dsl::block_reward.eq(reward as i64),
            ))
            .on_conflict((stats_dsl::datetime, stats_dsl::validator_index))
            .do_update()
            .set((
                stats_dsl::cl_rewards.eq(stats_dsl::cl_rewards + excluded(stats_dsl::cl_rewards)),
                stats_dsl::block_reward.eq(stats_dsl::block_reward + excluded(stats_dsl::block_reward)),
            ))
            .execute(conn)?;
        Ok(())
    })
}
