// @generated by hand to match migrations/2024-01-01-000000_init; keep in sync.

diesel::table! {
    epochs (epoch) {
        epoch -> BigInt,
        processed -> Bool,
        rewards_fetched -> Bool,
        validators_balances_fetched -> Bool,
        committees_fetched -> Bool,
        slots_fetched -> Bool,
        sync_committees_fetched -> Bool,
        validators_activation_fetched -> Bool,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    slots (slot) {
        slot -> BigInt,
        processed -> Bool,
        attestations_fetched -> Bool,
        sync_rewards_fetched -> Bool,
        block_rewards_fetched -> Bool,
        execution_rewards_fetched -> Bool,
        beacon_block_processed -> Bool,
        proposer_index -> Nullable<BigInt>,
        consensus_reward -> Nullable<BigInt>,
        committees_count_in_slot -> Nullable<Array<Integer>>,
        withdrawals -> Nullable<Text>,
        cl_deposits -> Nullable<Text>,
        cl_voluntary_exits -> Nullable<Text>,
        el_deposits -> Nullable<Text>,
        el_withdrawals -> Nullable<Text>,
        el_consolidations -> Nullable<Text>,
    }
}

diesel::table! {
    committees (slot, committee_index, aggregation_bits_index) {
        slot -> BigInt,
        committee_index -> Integer,
        aggregation_bits_index -> Integer,
        validator_index -> BigInt,
        attestation_delay -> Nullable<Integer>,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    sync_committees (from_epoch, to_epoch) {
        from_epoch -> BigInt,
        to_epoch -> BigInt,
        validators -> Array<BigInt>,
        validator_aggregates -> Array<Array<BigInt>>,
    }
}

diesel::table! {
    validators (id) {
        id -> BigInt,
        status -> Text,
        balance -> BigInt,
        effective_balance -> BigInt,
        withdrawal_address -> Nullable<Text>,
    }
}

diesel::table! {
    hourly_validator_stats (datetime, validator_index) {
        datetime -> Timestamptz,
        validator_index -> BigInt,
        cl_rewards -> BigInt,
        cl_missed_rewards -> BigInt,
        attestations_count -> Integer,
        head -> BigInt,
        target -> BigInt,
        source -> BigInt,
        inactivity -> BigInt,
        missed_head -> BigInt,
        missed_target -> BigInt,
        missed_source -> BigInt,
        missed_inactivity -> BigInt,
        sync_committee -> Integer,
        block_reward -> BigInt,
    }
}

diesel::table! {
    sync_committee_rewards (slot, validator_index) {
        slot -> BigInt,
        validator_index -> BigInt,
        reward -> BigInt,
    }
}

diesel::table! {
    execution_rewards (block_number) {
        block_number -> BigInt,
        address -> Text,
        timestamp -> Timestamptz,
        amount -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    epochs,
    slots,
    committees,
    sync_committees,
    validators,
    hourly_validator_stats,
    sync_committee_rewards,
    execution_rewards,
);
