use crate::error::Error;
use crate::models::SyncCommitteeRow;
use crate::schema::epochs::dsl as epochs_dsl;
use crate::schema::sync_committees::dsl;
use beacon_time::Epoch;
use diesel::prelude::*;
use indexer_types::SyncCommittee;

/// Upserts a sync committee keyed by `(fromEpoch, toEpoch)` and sets
/// `epoch.syncCommitteesFetched = true` for `epoch` (spec §4.4 "Sync
/// committees").
pub fn upsert_sync_committee(
    conn: &mut PgConnection,
    epoch: Epoch,
    committee: &SyncCommittee,
) -> Result<(), Error> {
    conn.transaction(|conn| {
        let validators: Vec<i64> = committee.validators.iter().map(|&v| v as i64).collect();
        let aggregates: Vec<Vec<i64>> = committee
            .validator_aggregates
            .iter()
            .map(|group| group.iter().map(|&v| v as i64).collect())
            .collect();

        diesel::insert_into(dsl::sync_committees)
            .values((
                dsl::from_epoch.eq(committee.from_epoch.as_u64() as i64),
                dsl::to_epoch.eq(committee.to_epoch.as_u64() as i64),
                dsl::validators.eq(&validators),
                dsl::validator_aggregates.eq(&aggregates),
            ))
            .on_conflict((dsl::from_epoch, dsl::to_epoch))
            .do_update()
            .set((
                dsl::validators.eq(&validators),
                dsl::validator_aggregates.eq(&aggregates),
            ))
            .execute(conn)?;

        diesel::update(epochs_dsl::epochs.find(epoch.as_u64() as i64))
            .set(epochs_dsl::sync_committees_fetched.eq(true))
            .execute(conn)?;
        Ok(())
    })
}

/// Looks up the sync committee covering `epoch`, used to gate
/// `blockAndSyncRewards` until the committee is persisted.
pub fn get_sync_committee_for_epoch(conn: &mut PgConnection, epoch: Epoch) -> Result<Option<SyncCommittee>, Error> {
    let row: Option<SyncCommitteeRow> = dsl::sync_committees
        .filter(dsl::from_epoch.le(epoch.as_u64() as i64))
        .filter(dsl::to_epoch.ge(epoch.as_u64() as i64))
        .first(conn)
        .optional()?;
    Ok(row.map(|r| SyncCommittee {
        from_epoch: Epoch::new(r.from_epoch as u64),
        to_epoch: Epoch::new(r.to_epoch as u64),
        validators: r.validators.into_iter().map(|v| v as u64).collect(),
        validator_aggregates: r
            .validator_aggregates
            .into_iter()
            .map(|group| group.into_iter().map(|v| v as u64).collect())
            .collect(),
    }))
}
