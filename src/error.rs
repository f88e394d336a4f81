//! Error types for the budget ledger.

/// All errors that can occur when encoding, decoding, saving or querying
/// ledger entries.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A network payload carried a date or amount that does not parse.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A transaction type name is not one of `SPEND`, `FUND`, `INFLOW`.
    #[error("unknown transaction type: {0:?}")]
    UnknownTransactionType(String),

    /// A persisted row cannot be decoded back into a ledger entry.
    #[error("corrupt record {sort_key:?}: {reason}")]
    CorruptRecord {
        /// Sort key of the offending row.
        sort_key: String,
        /// What failed to decode.
        reason: String,
    },

    /// A partial update targeted a row that does not exist.
    #[error("no row at ({partition}, {sort_key})")]
    RowNotFound {
        /// Partition (account) of the missing row.
        partition: String,
        /// Sort key of the missing row.
        sort_key: String,
    },

    /// The supplied query fields do not map onto any key or index.
    #[error("unsupported query: {0}")]
    UnsupportedQuery(String),

    /// Table configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage backend failed.
    #[error("storage error: {0}")]
    Storage(Box<dyn core::error::Error + Send + Sync>),
}

/// Convenience result alias for ledger operations.
pub type Result<T> = core::result::Result<T, LedgerError>;
