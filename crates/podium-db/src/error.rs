use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A UNIQUE constraint rejected the write. This is the authoritative
    /// duplicate signal; callers must not rely on a prior existence check.
    #[error("unique constraint violated")]
    Conflict,

    /// The statement matched no row.
    #[error("no row matched")]
    NotFound,

    #[error("database lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// Folds SQLITE_CONSTRAINT_UNIQUE into [`StoreError::Conflict`];
    /// everything else passes through unchanged.
    pub(crate) fn from_write(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                StoreError::Conflict
            }
            _ => StoreError::Sqlite(e),
        }
    }
}
