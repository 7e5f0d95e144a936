use crate::error::Error;
use crate::models::{EpochRow, NewEpochRow};
use crate::schema::epochs::dsl;
use beacon_time::Epoch;
use diesel::prelude::*;
use indexer_types::EpochRecord;

/// `createEpochs`: rejects non-consecutive batches and batches that don't
/// pick up exactly where the DB left off (spec §4.4 "Epoch creation").
/// `fallback_start` is `floor(slotStartIndexing / slotsPerEpoch)`, used only
/// when the table is empty.
pub fn create_epochs(
    conn: &mut PgConnection,
    requested: &[Epoch],
    fallback_start: Epoch,
) -> Result<(), Error> {
    let Some(&first) = requested.first() else {
        return Err(Error::EmptyEpochBatch);
    };
    for pair in requested.windows(2) {
        if pair[1].as_u64() != pair[0].as_u64() + 1 {
            return Err(Error::NonConsecutiveEpochs {
                requested_start: first.as_u64(),
                expected_start: first.as_u64(),
            });
        }
    }

    conn.transaction(|conn| {
        let max_in_db: Option<i64> = dsl::epochs.select(diesel::dsl::max(dsl::epoch)).first(conn)?;
        let expected_start = match max_in_db {
            Some(max) => max as u64 + 1,
            None => fallback_start.as_u64(),
        };
        if first.as_u64() != expected_start {
            return Err(Error::NonConsecutiveEpochs {
                requested_start: first.as_u64(),
                expected_start,
            });
        }

        let rows: Vec<NewEpochRow> = requested
            .iter()
            .map(|e| NewEpochRow { epoch: e.as_u64() as i64 })
            .collect();
        diesel::insert_into(dsl::epochs).values(&rows).execute(conn)?;
        Ok(())
    })
}

pub fn max_epoch_in_db(conn: &mut PgConnection) -> Result<Option<Epoch>, Error> {
    let max: Option<i64> = dsl::epochs.select(diesel::dsl::max(dsl::epoch)).first(conn)?;
    Ok(max.map(|e| Epoch::new(e as u64)))
}

pub fn unprocessed_count(conn: &mut PgConnection) -> Result<u64, Error> {
    let count: i64 = dsl::epochs
        .filter(dsl::processed.eq(false))
        .count()
        .get_result(conn)?;
    Ok(count as u64)
}

/// `getMinEpochToProcess`: the oldest unprocessed epoch, or `None` when
/// every created epoch has been fully processed.
pub fn min_epoch_to_process(conn: &mut PgConnection) -> Result<Option<EpochRecord>, Error> {
    let row: Option<EpochRow> = dsl::epochs
        .filter(dsl::processed.eq(false))
        .order(dsl::epoch.asc())
        .first(conn)
        .optional()?;
    Ok(row.map(Into::into))
}

pub fn get_epoch(conn: &mut PgConnection, epoch: Epoch) -> Result<Option<EpochRecord>, Error> {
    let row: Option<EpochRow> = dsl::epochs.find(epoch.as_u64() as i64).first(conn).optional()?;
    Ok(row.map(Into::into))
}

pub fn mark_epoch_as_processed(conn: &mut PgConnection, epoch: Epoch) -> Result<(), Error> {
    diesel::update(dsl::epochs.find(epoch.as_u64() as i64))
        .set(dsl::processed.eq(true))
        .execute(conn)?;
    Ok(())
}

pub fn set_committees_fetched(conn: &mut PgConnection, epoch: Epoch) -> Result<(), Error> {
    diesel::update(dsl::epochs.find(epoch.as_u64() as i64))
        .set(dsl::committees_fetched.eq(true))
        .execute(conn)?;
    Ok(())
}

pub fn set_sync_committees_fetched(conn: &mut PgConnection, epoch: Epoch) -> Result<(), Error> {
    diesel::update(dsl::epochs.find(epoch.as_u64() as i64))
        .set(dsl::sync_committees_fetched.eq(true))
        .execute(conn)?;
    Ok(())
}

pub fn set_validators_activation_fetched(conn: &mut PgConnection, epoch: Epoch) -> Result<(), Error> {
    diesel::update(dsl::epochs.find(epoch.as_u64() as i64))
        .set(dsl::validators_activation_fetched.eq(true))
        .execute(conn)?;
    Ok(())
}

pub fn set_slots_fetched(conn: &mut PgConnection, epoch: Epoch) -> Result<(), Error> {
    diesel::update(dsl::epochs.find(epoch.as_u64() as i64))
        .set(dsl::slots_fetched.eq(true))
        .execute(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_consecutive_batch() {
        let requested = vec![Epoch::new(10), Epoch::new(12)];
        let mut windows_ok = true;
        for pair in requested.windows(2) {
            if pair[1].as_u64() != pair[0].as_u64() + 1 {
                windows_ok = false;
            }
        }
        assert!(!windows_ok);
    }
}
