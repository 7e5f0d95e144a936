use crate::error::Error;
use crate::schema::epochs::dsl as epochs_dsl;
use crate::schema::hourly_validator_stats::dsl as stats_dsl;
use crate::schema::validators::dsl as validators_dsl;
use beacon_time::Epoch;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use indexer_types::{compute_reward_delta, effective_balance_bucket, AttestationRewardEntry, IdealAttestationReward};
use std::collections::HashMap;

/// Persists one epoch's attestation rewards: computes the per-validator
/// `missed*` deltas against the bucketed ideal reward, additively merges
/// them into `HourlyValidatorStats`, and sets `epoch.rewardsFetched = true`
/// — all in one transaction (spec §4.4 "Attestation rewards").
pub fn persist_attestation_rewards(
    conn: &mut PgConnection,
    epoch: Epoch,
    datetime_hour: DateTime<Utc>,
    actual: &[AttestationRewardEntry],
    ideal: &[IdealAttestationReward],
) -> Result<(), Error> {
    let ideal_by_bucket: HashMap<u64, &IdealAttestationReward> = ideal
        .iter()
        .map(|i| (effective_balance_bucket(i.effective_balance), i))
        .collect();

    let ids: Vec<i64> = actual.iter().map(|a| a.validator_index as i64).collect();
    let balances: Vec<(i64, i64)> = validators_dsl::validators
        .filter(validators_dsl::id.eq_any(&ids))
        .select((validators_dsl::id, validators_dsl::effective_balance))
        .load(conn)?;
    let balance_by_id: HashMap<i64, i64> = balances.into_iter().collect();

    conn.transaction(|conn| {
        for entry in actual {
            let effective_balance = balance_by_id
                .get(&(entry.validator_index as i64))
                .copied()
                .unwrap_or(0) as u64;
            let bucket = effective_balance_bucket(effective_balance);
            let Some(ideal_reward) = ideal_by_bucket.get(&bucket) else {
                continue;
            };
            let delta = compute_reward_delta(entry, ideal_reward);

            diesel::insert_into(stats_dsl::hourly_validator_stats)
                .values((
                    stats_dsl::datetime.eq(datetime_hour),
                    stats_dsl::validator_index.eq(entry.validator_index as i64),
                    stats_dsl::cl_rewards.eq(delta.cl_rewards),
                    stats_dsl::cl_missed_rewards.eq(delta.cl_missed_rewards),
                    stats_dsl::attestations_count.eq(delta.attestations_count as i32),
                    stats_dsl::head.eq(delta.head),
                    stats_dsl::target.eq(delta.target),
                    stats_dsl::source.eq(delta.source),
                    stats_dsl::inactivity.eq(delta.inactivity),
                    stats_dsl::missed_head.eq(delta.missed_head),
                    stats_dsl::missed_target.eq(delta.missed_target),
                    stats_dsl::missed_source.eq(delta.missed_source),
                    stats_dsl::missed_inactivity.eq(delta.missed_inactivity),
                ))
                .on_conflict((stats_dsl::datetime, stats_dsl::validator_index))
                .do_update()
                .set((
                    stats_dsl::cl_rewards.eq(stats_dsl::cl_rewards + excluded(stats_dsl::cl_rewards)),
                    stats_dsl::cl_missed_rewards
                        .eq(stats_dsl::cl_missed_rewards + excluded(stats_dsl::cl_missed_rewards)),
                    stats_dsl::attestations_count
                        .eq(stats_dsl::attestations_count + excluded(stats_dsl::attestations_count)),
                    stats_dsl::head.eq(stats_dsl::head + excluded(stats_dsl::head)),
                    stats_dsl::target.eq(stats_dsl::target + excluded(stats_dsl::target)),
                    stats_dsl::source.eq(stats_dsl::source + excluded(stats_dsl::source)),
                    stats_dsl::inactivity.eq(stats_dsl::inactivity + excluded(stats_dsl::inactivity)),
                    stats_dsl::missed_head.eq(stats_dsl::missed_head + excluded(stats_dsl::missed_head)),
                    stats_dsl::missed_target.eq(stats_dsl::missed_target + excluded(stats_dsl::missed_target)),
                    stats_dsl::missed_source.eq(stats_dsl::missed_source + excluded(stats_dsl::missed_source)),
                    stats_dsl::missed_inactivity
                        .eq(stats_dsl::missed_inactivity + excluded(stats_dsl::missed_inactivity)),
                ))
                .execute(conn)?;
        }

        diesel::update(epochs_dsl::epochs.find(epoch.as_u64() as i64))
            .set(epochs_dsl::rewards_fetched.eq(true))
            .execute(conn)?;
        Ok(())
    })
}
