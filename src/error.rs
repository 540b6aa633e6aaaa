//! Error handling module
//!
//! Provides the error taxonomy for a reconciliation run. Fatal errors are
//! collected in [`ReconError`] and stop the run; [`QueryError`] stays local to
//! a single table and ends up in that table's report row.

use crate::align::Side;
use crate::config::ConfigError;
use std::time::Duration;
use thiserror::Error;

/// Fatal, run-level error
#[derive(Error, Debug)]
pub enum ReconError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Could not decrypt the {side} connection descriptor: {source}")]
    Decryption {
        side: Side,
        #[source]
        source: DecryptionError,
    },

    #[error("Could not connect to the {side} database: {message}")]
    Connection { side: Side, message: String },

    #[error("Could not read the {side} table catalog: {message}")]
    Catalog { side: Side, message: String },
}

impl ReconError {
    /// Short name of the stage that failed, used in log lines
    pub fn stage(&self) -> &'static str {
        match self {
            ReconError::Configuration(_) => "configuration",
            ReconError::Decryption { .. } => "decryption",
            ReconError::Connection { .. } => "connection",
            ReconError::Catalog { .. } => "catalog",
        }
    }

    /// Classify a failed catalog fetch for one side
    pub fn from_catalog_failure(side: Side, err: QueryError) -> Self {
        match err {
            QueryError::Connect(message) => ReconError::Connection { side, message },
            other => ReconError::Catalog {
                side,
                message: other.to_string(),
            },
        }
    }
}

/// Secret codec failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecryptionError {
    #[error("encryption key is empty")]
    EmptyKey,

    #[error("ciphertext is not valid Base64: {0}")]
    InvalidBase64(String),

    #[error("ciphertext is too short ({0} bytes) to hold an IV and a block")]
    TooShort(usize),

    #[error("ciphertext length {0} is not a multiple of the cipher block size")]
    Misaligned(usize),

    #[error("ciphertext could not be decrypted with the given key")]
    BadPadding,

    #[error("decrypted payload is not valid UTF-8")]
    InvalidUtf8,
}

/// Failure of a single catalog or row-count query
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("query timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("unexpected result: {0}")]
    UnexpectedResult(String),
}

impl From<tokio_postgres::Error> for QueryError {
    fn from(e: tokio_postgres::Error) -> Self {
        QueryError::Query(e.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for QueryError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        QueryError::Connect(e.to_string())
    }
}

impl From<tiberius::error::Error> for QueryError {
    fn from(e: tiberius::error::Error) -> Self {
        QueryError::Query(e.to_string())
    }
}

impl From<oracle::Error> for QueryError {
    fn from(e: oracle::Error) -> Self {
        QueryError::Query(e.to_string())
    }
}
