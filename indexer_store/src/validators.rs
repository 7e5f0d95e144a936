use crate::error::Error;
use crate::models::ValidatorRow;
use crate::schema::epochs::dsl as epochs_dsl;
use crate::schema::validators::dsl;
use beacon_time::Epoch;
use diesel::prelude::*;
use diesel::upsert::excluded;
use indexer_types::{Validator, ValidatorApiEntry, ValidatorStatus};

/// Bulk upsert of validator balances, keyed by validator id; on conflict
/// only `balance` changes. Sets `epoch.validatorsBalancesFetched = true` in
/// the same transaction (spec §4.4 "Validator balances"). A genuine staging
/// temp table buys nothing diesel's single multi-row `ON CONFLICT` insert
/// doesn't already give atomically; see DESIGN.md.
pub fn upsert_validator_balances(
    conn: &mut PgConnection,
    epoch: Epoch,
    entries: &[ValidatorApiEntry],
) -> Result<(), Error> {
    conn.transaction(|conn| {
        for chunk in entries.chunks(1000) {
            let rows: Vec<_> = chunk
                .iter()
                .map(|v| {
                    (
                        dsl::id.eq(v.index as i64),
                        dsl::balance.eq(v.balance as i64),
                        dsl::status.eq(v.status.to_string()),
                        dsl::effective_balance.eq(v.validator.effective_balance as i64),
                        dsl::withdrawal_address.eq(v.validator.withdrawal_address()),
                    )
                })
                .collect();
            diesel::insert_into(dsl::validators)
                .values(&rows)
                .on_conflict(dsl::id)
                .do_update()
                .set(dsl::balance.eq(excluded(dsl::balance)))
                .execute(conn)?;
        }

        diesel::update(epochs_dsl::epochs.find(epoch.as_u64() as i64))
            .set(epochs_dsl::validators_balances_fetched.eq(true))
            .execute(conn)?;
        Ok(())
    })
}

/// Full upsert (status, balance, effective balance, withdrawal address),
/// used by activation tracking and by `getValidators` responses generally.
pub fn upsert_validators(conn: &mut PgConnection, entries: &[ValidatorApiEntry]) -> Result<(), Error> {
    for chunk in entries.chunks(1000) {
        let rows: Vec<_> = chunk
            .iter()
            .map(|v| {
                (
                    dsl::id.eq(v.index as i64),
                    dsl::status.eq(v.status.to_string()),
                    dsl::balance.eq(v.balance as i64),
                    dsl::effective_balance.eq(v.validator.effective_balance as i64),
                    dsl::withdrawal_address.eq(v.validator.withdrawal_address()),
                )
            })
            .collect();
        diesel::insert_into(dsl::validators)
            .values(&rows)
            .on_conflict(dsl::id)
            .do_update()
            .set((
                dsl::status.eq(excluded(dsl::status)),
                dsl::balance.eq(excluded(dsl::balance)),
                dsl::effective_balance.eq(excluded(dsl::effective_balance)),
                dsl::withdrawal_address.eq(excluded(dsl::withdrawal_address)),
            ))
            .execute(conn)?;
    }
    Ok(())
}

pub fn get_validator(conn: &mut PgConnection, id: u64) -> Result<Option<Validator>, Error> {
    let row: Option<ValidatorRow> = dsl::validators.find(id as i64).first(conn).optional()?;
    Ok(row.map(row_to_validator))
}

fn row_to_validator(row: ValidatorRow) -> Validator {
    Validator {
        id: row.id as u64,
        status: row.status.parse().unwrap_or(ValidatorStatus::PendingInitialized),
        balance: row.balance as u64,
        effective_balance: row.effective_balance as u64,
        withdrawal_address: row.withdrawal_address,
    }
}

/// Validator ids eligible for a `getAttestationRewards` request: no stored
/// status yet, `active_ongoing`, or `active_exiting` (spec §4.4).
pub fn reward_eligible_validator_ids(conn: &mut PgConnection, ids: &[u64]) -> Result<Vec<u64>, Error> {
    let id_list: Vec<i64> = ids.iter().map(|&i| i as i64).collect();
    let known: Vec<ValidatorRow> = dsl::validators.filter(dsl::id.eq_any(&id_list)).load(conn)?;
    let known_ids: std::collections::HashSet<i64> = known.iter().map(|r| r.id).collect();
    let mut eligible: Vec<u64> = known
        .into_iter()
        .filter(|r| matches!(r.status.as_str(), "active_ongoing" | "active_exiting"))
        .map(|r| r.id as u64)
        .collect();
    for &id in &id_list {
        if !known_ids.contains(&id) {
            eligible.push(id as u64);
        }
    }
    Ok(eligible)
}

/// Ids of validators currently stored with a pending status, the set
/// `trackingValidatorsActivation` re-polls each epoch (spec §4.5.3 region
/// 5).
pub fn pending_validator_ids(conn: &mut PgConnection) -> Result<Vec<u64>, Error> {
    let ids: Vec<i64> = dsl::validators
        .filter(dsl::status.eq_any(["pending_initialized", "pending_queued"]))
        .select(dsl::id)
        .load(conn)?;
    Ok(ids.into_iter().map(|i| i as u64).collect())
}

/// All known validator ids with `active_ongoing` or `active_exiting`
/// status, the set `validatorsBalances` refreshes each epoch.
pub fn active_validator_ids(conn: &mut PgConnection) -> Result<Vec<u64>, Error> {
    let ids: Vec<i64> = dsl::validators
        .filter(dsl::status.eq_any(["active_ongoing", "active_exiting"]))
        .select(dsl::id)
        .load(conn)?;
    Ok(ids.into_iter().map(|i| i as u64).collect())
}
