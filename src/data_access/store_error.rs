use thiserror::Error;

/// Failure of a document store call. Anything the driver reports ends up here.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redb: {0}")]
    Driver(String),
    #[error("encode: {0}")]
    Encode(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("duplicate key: a document with _id '{0}' already exists")]
    DuplicateKey(String),
    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("store worker failed: {0}")]
    Worker(String),
}

// redb 2.x has many error types. Blanket them all into StoreError::Driver.
macro_rules! from_redb {
    ($($t:ty),*) => {
        $(impl From<$t> for StoreError {
            fn from(e: $t) -> Self { StoreError::Driver(e.to_string()) }
        })*
    };
}

from_redb!(
    redb::Error,
    redb::DatabaseError,
    redb::TableError,
    redb::TransactionError,
    redb::StorageError,
    redb::CommitError
);

impl From<tokio::task::JoinError> for StoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        StoreError::Worker(e.to_string())
    }
}
