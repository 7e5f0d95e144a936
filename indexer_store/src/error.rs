/// Errors raised by the storage layer. Precondition violations (§7
/// "Schema/consistency precondition violated") are distinguished from plain
/// database failures so callers can tell a bug in the caller apart from a
/// transient connection problem.
#[derive(Debug)]
pub enum Error {
    Database(diesel::result::Error),
    Pool(r2d2::Error),
    Migration(Box<dyn std::error::Error + Send + Sync>),
    /// `createEpochs` was given a non-consecutive run, or one that does not
    /// start at `maxEpochInDB + 1`.
    NonConsecutiveEpochs {
        requested_start: u64,
        expected_start: u64,
    },
    EmptyEpochBatch,
    /// A business step's precondition flag was already set (e.g.
    /// `fetchCommittees` invoked on an epoch that already has
    /// `committeesFetched = true`); callers treat this as already-done.
    AlreadyFetched(&'static str),
}

impl From<diesel::result::Error> for Error {
    fn from(e: diesel::result::Error) -> Self {
        Error::Database(e)
    }
}

impl From<r2d2::Error> for Error {
    fn from(e: r2d2::Error) -> Self {
        Error::Pool(e)
    }
}
