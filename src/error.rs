use thiserror::Error;

/// Raised when a joiner is built over a store that can't express absence.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("store used in a join has a default value, absent keys must read as absent")]
    DefaultValue,
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("json codec failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a store `get`, `put` or `delete`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
    #[error("codec error: {0}")]
    Format(#[from] FormatError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("changelog restore failed: {0}")]
    Restore(String),
}
