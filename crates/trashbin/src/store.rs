/// Failure modes shared by every storage trait in the crate.
///
/// `VersionConflict` signals a lost optimistic update: the caller read a
/// record, someone else committed first, and the guarded write was refused.
/// Services re-read and re-validate before retrying.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("concurrent update lost")]
    VersionConflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Bound on guarded-write retries before an operation gives up.
pub(crate) const MAX_COMMIT_ATTEMPTS: usize = 4;
