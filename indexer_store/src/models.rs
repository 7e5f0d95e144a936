use crate::schema::*;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Identifiable, AsChangeset)]
#[diesel(table_name = epochs, primary_key(epoch))]
pub struct EpochRow {
    pub epoch: i64,
    pub processed: bool,
    pub rewards_fetched: bool,
    pub validators_balances_fetched: bool,
    pub committees_fetched: bool,
    pub slots_fetched: bool,
    pub sync_committees_fetched: bool,
    pub validators_activation_fetched: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = epochs)]
pub struct NewEpochRow {
    pub epoch: i64,
}

impl From<EpochRow> for indexer_types::EpochRecord {
    fn from(row: EpochRow) -> Self {
        indexer_types::EpochRecord {
            epoch: beacon_time::Epoch::new(row.epoch as u64),
            flags: indexer_types::EpochFlags {
                processed: row.processed,
                rewards_fetched: row.rewards_fetched,
                validators_balances_fetched: row.validators_balances_fetched,
                committees_fetched: row.committees_fetched,
                slots_fetched: row.slots_fetched,
                sync_committees_fetched: row.sync_committees_fetched,
                validators_activation_fetched: row.validators_activation_fetched,
            },
        }
    }
}

#[derive(Debug, Clone, Queryable, Identifiable, AsChangeset)]
#[diesel(table_name = slots, primary_key(slot))]
pub struct SlotRow {
    pub slot: i64,
    pub processed: bool,
    pub attestations_fetched: bool,
    pub sync_rewards_fetched: bool,
    pub block_rewards_fetched: bool,
    pub execution_rewards_fetched: bool,
    pub beacon_block_processed: bool,
    pub proposer_index: Option<i64>,
    pub consensus_reward: Option<i64>,
    pub committees_count_in_slot: Option<Vec<i32>>,
    pub withdrawals: Option<String>,
    pub cl_deposits: Option<String>,
    pub cl_voluntary_exits: Option<String>,
    pub el_deposits: Option<String>,
    pub el_withdrawals: Option<String>,
    pub el_consolidations: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = slots)]
pub struct NewSlotRow {
    pub slot: i64,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = committees)]
pub struct CommitteeRow {
    pub slot: i64,
    pub committee_index: i32,
    pub aggregation_bits_index: i32,
    pub validator_index: i64,
    pub attestation_delay: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = sync_committees)]
pub struct SyncCommitteeRow {
    pub from_epoch: i64,
    pub to_epoch: i64,
    pub validators: Vec<i64>,
    pub validator_aggregates: Vec<Vec<i64>>,
}

#[derive(Debug, Clone, Queryable, Identifiable, AsChangeset)]
#[diesel(table_name = validators, primary_key(id))]
pub struct ValidatorRow {
    pub id: i64,
    pub status: String,
    pub balance: i64,
    pub effective_balance: i64,
    pub withdrawal_address: Option<String>,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = hourly_validator_stats)]
pub struct HourlyValidatorStatsRow {
    pub datetime: DateTime<Utc>,
    pub validator_index: i64,
    pub cl_rewards: i64,
    pub cl_missed_rewards: i64,
    pub attestations_count: i32,
    pub head: i64,
    pub target: i64,
    pub source: i64,
    pub inactivity: i64,
    pub missed_head: i64,
    pub missed_target: i64,
    pub missed_source: i64,
    pub missed_inactivity: i64,
    pub sync_committee: i32,
    pub block_reward: i64,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = sync_committee_rewards)]
pub struct SyncCommitteeRewardRow {
    pub slot: i64,
    pub validator_index: i64,
    pub reward: i64,
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = execution_rewards)]
pub struct ExecutionRewardRow {
    pub block_number: i64,
    pub address: String,
    pub timestamp: DateTime<Utc>,
    pub amount: String,
}
