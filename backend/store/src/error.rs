use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("number range for {0} not found")]
    RangeMissing(String),

    #[error("number range for {0} has been exhausted")]
    RangeExhausted(String),

    #[error("{0} already exists")]
    Duplicate(String),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed stored document: {0}")]
    Corrupt(#[from] serde_json::Error),
}
