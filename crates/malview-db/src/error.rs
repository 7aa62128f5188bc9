//! Cache errors.

/// Internal failure of a cache operation.
///
/// The public cache API never returns this: a failed read is reported as a
/// miss and a failed write is logged.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The key-value medium failed.
    #[error("cache storage failure: {0:#}")]
    Storage(anyhow::Error),

    /// A stored payload could not be parsed.
    #[error("corrupt cache payload under {key}")]
    Corrupt {
        /// Storage key.
        key: &'static str,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A stored timestamp could not be parsed.
    #[error("invalid cache timestamp under {key}: {value}")]
    Timestamp {
        /// Storage key.
        key: &'static str,
        /// Raw stored value.
        value: String,
    },

    /// A payload could not be serialised.
    #[error("failed to serialise cache payload")]
    Serialize(#[source] serde_json::Error),
}
